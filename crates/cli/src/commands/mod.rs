use caviar_core::SamplerConfig;
use clap::Subcommand;
use std::path::PathBuf;

pub mod clusters;
pub mod sample;

#[derive(Subcommand)]
pub enum Commands {
    /// Draw partitions from the EPA prior
    #[command(visible_alias = "s")]
    Sample {
        /// JSON file holding the similarity matrix as an array of rows
        #[arg(long, value_name = "FILE")]
        similarity: PathBuf,

        /// Number of partitions to draw
        #[arg(short = 'n', long = "samples")]
        samples: usize,

        /// Mass parameter (defaults to the configured mass)
        #[arg(long)]
        mass: Option<f64>,

        /// Discount parameter (defaults to the configured discount)
        #[arg(long)]
        discount: Option<f64>,

        /// Worker threads, 0 for all logical CPUs (defaults to the configured count)
        #[arg(long)]
        cores: Option<usize>,

        /// Seed for the random stream (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Visit items in their natural order instead of shuffling per sample
        #[arg(long)]
        natural: bool,
    },

    /// Expected number of clusters for a mass, discount and item count
    ExpectedClusters {
        #[arg(long)]
        mass: f64,

        #[arg(long)]
        items: usize,

        #[arg(long, default_value_t = 0.0)]
        discount: f64,
    },

    /// Mass giving a target expected number of clusters
    Mass {
        #[arg(long)]
        expected: f64,

        #[arg(long)]
        items: usize,

        #[arg(long, default_value_t = 0.0)]
        discount: f64,
    },
}

impl Commands {
    pub fn execute(self, config: &SamplerConfig) -> anyhow::Result<serde_json::Value> {
        let value = match self {
            Commands::Sample {
                similarity,
                samples,
                mass,
                discount,
                cores,
                seed,
                natural,
            } => {
                let options = sample::SampleOptions {
                    n_samples: samples,
                    mass: mass.unwrap_or(config.default_mass),
                    discount: discount.unwrap_or(config.default_discount),
                    n_cores: cores.unwrap_or(config.n_cores),
                    seed: seed.unwrap_or_else(rand::random),
                    randomize_permutation: !natural && config.randomize_permutation,
                };
                let matrix = crate::similarity::read_similarity(&similarity)?;
                serde_json::to_value(sample::execute(&matrix, &options)?)?
            }
            Commands::ExpectedClusters {
                mass,
                items,
                discount,
            } => serde_json::to_value(clusters::expected_clusters(mass, discount, items)?)?,
            Commands::Mass {
                expected,
                items,
                discount,
            } => serde_json::to_value(clusters::mass(expected, discount, items)?)?,
        };
        Ok(value)
    }
}
