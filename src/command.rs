use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::data::augment::{self, AugmentMode, Augmentation};
use crate::data::filter;
use crate::data::model::{Dataset, Schema};
use crate::data::sort::{self, SortOrder};
use crate::data::summary::{self, BoxGroup, Description, Histogram};
use crate::error::{EngineError, Result};

// ---------------------------------------------------------------------------
// Command – one tokenised request
// ---------------------------------------------------------------------------

/// A parsed command. Arguments are kept as raw tokens; they are validated
/// against the schema when the command runs, column first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filter { column: String, value: String },
    Describe { column: String },
    Unique { column: String },
    Sort { column: String, order: String },
    Augment { percent: String, mode: String },
    Scatter { x: String, y: String },
    Hist { column: String, bins: String },
    Boxplot { group: String, value: String },
}

fn arg<S: AsRef<str>>(tokens: &[S], i: usize, usage: &str) -> Result<String> {
    tokens
        .get(i)
        .map(|t| t.as_ref().to_string())
        .ok_or_else(|| EngineError::MissingArgument(format!("Missing argument. Usage: {usage}")))
}

impl Command {
    /// Parse `tokens`, where token 0 names the operation.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let Some(op) = tokens.first() else {
            return Err(EngineError::MissingArgument("No command given.".to_string()));
        };

        let cmd = match op.as_ref() {
            "filter" => {
                let usage = "filter <column> <value>";
                Command::Filter {
                    column: arg(tokens, 1, usage)?,
                    value: arg(tokens, 2, usage)?,
                }
            }
            "describe" => Command::Describe {
                column: arg(tokens, 1, "describe <column>")?,
            },
            "unique" => Command::Unique {
                column: arg(tokens, 1, "unique <column>")?,
            },
            "sort" => {
                let usage = "sort <column> <asc|desc>";
                Command::Sort {
                    column: arg(tokens, 1, usage)?,
                    order: arg(tokens, 2, usage)?,
                }
            }
            "augment" => {
                let usage = "augment <percent> <duplicate|create>";
                Command::Augment {
                    percent: arg(tokens, 1, usage)?,
                    mode: arg(tokens, 2, usage)?,
                }
            }
            "scatter" => {
                let usage = "scatter <x_column> <y_column>";
                Command::Scatter {
                    x: arg(tokens, 1, usage)?,
                    y: arg(tokens, 2, usage)?,
                }
            }
            "hist" => {
                let usage = "hist <column> <bins>";
                Command::Hist {
                    column: arg(tokens, 1, usage)?,
                    bins: arg(tokens, 2, usage)?,
                }
            }
            "boxplot" => {
                let usage = "boxplot <group_column> <value_column>";
                Command::Boxplot {
                    group: arg(tokens, 1, usage)?,
                    value: arg(tokens, 2, usage)?,
                }
            }
            other => {
                return Err(EngineError::InvalidOption(format!(
                    "Unknown command '{other}'."
                )))
            }
        };
        Ok(cmd)
    }

    /// Operation name, as typed.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Filter { .. } => "filter",
            Command::Describe { .. } => "describe",
            Command::Unique { .. } => "unique",
            Command::Sort { .. } => "sort",
            Command::Augment { .. } => "augment",
            Command::Scatter { .. } => "scatter",
            Command::Hist { .. } => "hist",
            Command::Boxplot { .. } => "boxplot",
        }
    }

    /// Run against `dataset` without touching it.
    pub fn run<R: Rng + ?Sized>(&self, schema: &Schema, dataset: &Dataset, rng: &mut R) -> Result<Outcome> {
        let outcome = match self {
            Command::Filter { column, value } => {
                let rows = filter::filter_rows(schema, dataset, column, value)?;
                Outcome::Rows {
                    rows: rows.into_iter().cloned().collect(),
                }
            }
            Command::Describe { column } => Outcome::Description {
                column: column.clone(),
                description: summary::describe(schema, dataset, column)?,
            },
            Command::Unique { column } => Outcome::Counts {
                column: column.clone(),
                counts: summary::unique_counts(schema, dataset, column)?,
            },
            Command::Sort { column, order } => {
                schema.column_index(column)?;
                let order: SortOrder = order.parse()?;
                let start = Instant::now();
                let sorted = sort::sort_dataset(schema, dataset, column, order)?;
                let elapsed = start.elapsed();
                info!("sorted {} rows by {column} ({order}) in {elapsed:?}", sorted.len());
                Outcome::Sorted {
                    dataset: sorted,
                    column: column.clone(),
                    order,
                    elapsed_secs: elapsed.as_secs_f64(),
                }
            }
            Command::Augment { percent, mode } => {
                let percent = augment::parse_percent(percent)?;
                let mode: AugmentMode = mode.parse()?;
                Outcome::Augmented(augment::augment(schema, dataset, percent, mode, rng)?)
            }
            Command::Scatter { x, y } => Outcome::Points {
                points: summary::scatter_points(schema, dataset, x, y)?,
            },
            Command::Hist { column, bins } => {
                schema.numeric_index(column)?;
                let bins = bins.trim().parse::<usize>().map_err(|_| {
                    EngineError::InvalidNumber(format!("Bin count must be an integer, got '{bins}'."))
                })?;
                Outcome::Histogram {
                    column: column.clone(),
                    histogram: summary::histogram(schema, dataset, column, bins)?,
                }
            }
            Command::Boxplot { group, value } => Outcome::Groups {
                groups: summary::boxplot_groups(schema, dataset, group, value)?,
            },
        };
        Ok(outcome)
    }
}

// ---------------------------------------------------------------------------
// Outcome – what a command hands back to the renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Rows {
        rows: Dataset,
    },
    Description {
        column: String,
        description: Option<Description>,
    },
    Counts {
        column: String,
        counts: IndexMap<String, usize>,
    },
    Sorted {
        dataset: Dataset,
        column: String,
        order: SortOrder,
        elapsed_secs: f64,
    },
    Augmented(Augmentation),
    Points {
        points: Vec<(f64, f64)>,
    },
    Histogram {
        column: String,
        histogram: Option<Histogram>,
    },
    Groups {
        groups: IndexMap<String, BoxGroup>,
    },
}

impl Outcome {
    /// The table carried by this outcome, if any.
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Outcome::Rows { rows } => Some(rows),
            Outcome::Sorted { dataset, .. } => Some(dataset),
            Outcome::Augmented(aug) => Some(&aug.dataset),
            _ => None,
        }
    }

    /// Wall time of a sort.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Outcome::Sorted { elapsed_secs, .. } => Some(Duration::from_secs_f64(*elapsed_secs)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Session – the current dataset plus the injected random source
// ---------------------------------------------------------------------------

/// Holds the working dataset between commands.
///
/// Sort and augment results replace the working dataset; every other command
/// leaves it as is.
pub struct Session<R: Rng> {
    schema: Schema,
    dataset: Dataset,
    rng: R,
}

impl<R: Rng> Session<R> {
    pub fn new(schema: Schema, dataset: Dataset, rng: R) -> Self {
        Self {
            schema,
            dataset,
            rng,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Swap in a freshly loaded dataset.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
    }

    /// Parse and run one command.
    pub fn execute<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<Outcome> {
        let command = Command::parse(tokens)?;
        self.run(&command)
    }

    pub fn run(&mut self, command: &Command) -> Result<Outcome> {
        debug!("running {command:?} on {} rows", self.dataset.len());
        let outcome = command.run(&self.schema, &self.dataset, &mut self.rng)?;
        match &outcome {
            Outcome::Sorted { dataset, .. } => self.dataset = dataset.clone(),
            Outcome::Augmented(aug) => {
                info!("{} added {} rows", aug.mode, aug.added);
                self.dataset = aug.dataset.clone();
            }
            _ => {}
        }
        Ok(outcome)
    }
}
