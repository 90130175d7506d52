//! Hook through which the engine asks the caller for likelihood values
//! mid-sample

use caviar_core::Result;

/// Host-supplied likelihood evaluation
///
/// Implementations are called synchronously from inside [`crate::sample`].
/// They receive borrowed engine state and must not retain it. Returning an
/// error aborts the whole sampling call.
pub trait Likelihood {
    /// Log marginal likelihood of the given items forming one cluster
    fn subset_log_likelihood(&mut self, items: &[usize]) -> Result<f64>;

    /// Log likelihood of placing `item` in `label`; `is_new` marks a label
    /// that currently has no members
    fn item_log_likelihood(&mut self, item: usize, label: usize, is_new: bool) -> Result<f64>;
}

impl<L: Likelihood + ?Sized> Likelihood for &mut L {
    fn subset_log_likelihood(&mut self, items: &[usize]) -> Result<f64> {
        (**self).subset_log_likelihood(items)
    }

    fn item_log_likelihood(&mut self, item: usize, label: usize, is_new: bool) -> Result<f64> {
        (**self).item_log_likelihood(item, label, is_new)
    }
}

/// How allocation weights are formed for one sampling call
pub enum Allocation<'a> {
    /// The EPA prior alone
    Prior,
    /// Prior weight times `exp(ℓ(c ∪ {i}) − ℓ(c))` from subset evaluations
    Subset(&'a mut dyn Likelihood),
    /// Prior weight times `exp(ℓ(i → c))` from item evaluations
    Item(&'a mut dyn Likelihood),
}

impl Allocation<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Allocation::Prior => "prior",
            Allocation::Subset(_) => "subset",
            Allocation::Item(_) => "item",
        }
    }
}

impl std::fmt::Debug for Allocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
