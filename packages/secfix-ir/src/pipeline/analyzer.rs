/*
 * Analyzer - fixed-point driver over the remediation catalog
 *
 * One cycle runs every enabled catalog entry as its own pass:
 *
 *   tree ──pass(zip-slip)──> tree' ──pass(cookie-secure)──> tree'' ──> ...
 *
 * Cycles repeat until one changes nothing or `max_cycles` is reached. A pass
 * whose result is structurally equal to its input is discarded. A failing
 * pass is recorded, its entry is skipped for the rest of the run and the tree
 * from before it is kept (unless `fail_fast` is set). Findings of
 * report-only passes accumulate without counting as changes.
 */

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use super::outcome::{AnalysisOutcome, FixFailure};
use crate::config::{RemediationConfig, ValidatedConfig};
use crate::errors::Result;
use crate::features::matching::ShapeMatcher;
use crate::features::patch_synthesis::PatchSynthesizer;
use crate::features::remediation::{instantiate, run_pass_reporting, Catalog, CatalogEntry, PassOutput, PassServices};
use crate::shared::models::CompilationUnit;

pub struct Analyzer {
    config: ValidatedConfig,
    catalog: Catalog,
    services: PassServices,
}

impl Analyzer {
    /// Fails when the configuration names remediations missing from `catalog`
    pub fn new(config: ValidatedConfig, catalog: Catalog) -> Result<Self> {
        config.check_known_ids(catalog.ids())?;
        let services = PassServices::new(config.flow());
        info!(config = %config.describe(), remediations = catalog.len(), "analyzer ready");
        Ok(Self {
            config,
            catalog,
            services,
        })
    }

    /// Default configuration with the built-in catalog
    pub fn builtin() -> Self {
        let config = ValidatedConfig::default();
        let services = PassServices::new(config.flow());
        Self {
            config,
            catalog: Catalog::builtin(),
            services,
        }
    }

    /// Builder: Set the shape matcher used by every pass
    pub fn with_matcher(mut self, matcher: Arc<dyn ShapeMatcher>) -> Self {
        self.services = self.services.with_matcher(matcher);
        self
    }

    /// Builder: Set the synthesizer used by every pass
    pub fn with_synthesizer(mut self, synthesizer: Arc<PatchSynthesizer>) -> Self {
        self.services = self.services.with_synthesizer(synthesizer);
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Enabled entries with their effective settings, in catalog order
    fn passes(&self) -> Vec<(&CatalogEntry, RemediationConfig)> {
        self.catalog
            .entries()
            .iter()
            .filter_map(|entry| self.config.remediation(&entry.id).map(|settings| (entry, settings)))
            .collect()
    }

    fn run_entry(
        &self,
        entry: &CatalogEntry,
        settings: &RemediationConfig,
        tree: &Arc<CompilationUnit>,
    ) -> Result<PassOutput> {
        let mut visitor = instantiate(entry, settings, self.services.clone())?;
        run_pass_reporting(&mut visitor, tree)
    }

    /// Analyze one compilation unit until no pass changes it
    pub fn run(&self, tree: &Arc<CompilationUnit>) -> Result<AnalysisOutcome> {
        let driver = self.config.driver();
        let passes = self.passes();
        let mut outcome = AnalysisOutcome::unchanged(tree.clone());
        let mut failed: FxHashSet<&str> = FxHashSet::default();

        while outcome.cycles < driver.max_cycles {
            outcome.cycles += 1;
            let cycle = outcome.cycles;
            let mut fixes = 0usize;

            for (entry, settings) in &passes {
                if failed.contains(entry.id.as_str()) {
                    continue;
                }
                match self.run_entry(entry, settings, &outcome.tree) {
                    Ok(PassOutput { tree: next, findings }) => {
                        outcome.record_findings(findings);
                        if Arc::ptr_eq(&next, &outcome.tree) || *next == *outcome.tree {
                            continue;
                        }
                        debug!(remediation = %entry.id, cycle, "pass changed the tree");
                        outcome.tree = next;
                        fixes += 1;
                    }
                    Err(err) if driver.fail_fast => return Err(err),
                    Err(err) => {
                        warn!(remediation = %entry.id, cycle, error = %err, "remediation pass failed, tree kept");
                        failed.insert(entry.id.as_str());
                        outcome.failures.push(FixFailure {
                            remediation_id: entry.id.clone(),
                            cycle,
                            message: err.to_string(),
                        });
                    }
                }
            }

            outcome.applied_passes += fixes;
            info!(cycle, fixes, "analysis cycle complete");
            if fixes == 0 {
                break;
            }
            if outcome.cycles == driver.max_cycles {
                warn!(max_cycles = driver.max_cycles, "cycle limit reached before a fixed point");
            }
        }

        outcome.changed = outcome.applied_passes > 0;
        Ok(outcome)
    }

    /// Analyze independent compilation units, in parallel when enabled
    pub fn analyze_batch(&self, trees: &[Arc<CompilationUnit>]) -> Vec<Result<AnalysisOutcome>> {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<Result<AnalysisOutcome>> = {
            use rayon::prelude::*;
            trees.par_iter().map(|tree| self.run(tree)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Result<AnalysisOutcome>> = trees.iter().map(|tree| self.run(tree)).collect();

        let changed = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(outcome) if outcome.changed))
            .count();
        info!(trees = trees.len(), changed, "batch analysis complete");
        outcomes
    }
}

/// Fix every vulnerability `catalog` knows about, with the default configuration
///
/// Returns `tree` itself when nothing was found.
pub fn analyze(tree: &Arc<CompilationUnit>, catalog: &Catalog) -> Arc<CompilationUnit> {
    match Analyzer::new(ValidatedConfig::default(), catalog.clone()).and_then(|analyzer| analyzer.run(tree)) {
        Ok(outcome) => outcome.tree,
        Err(err) => {
            warn!(error = %err, "analysis aborted, tree left unchanged");
            tree.clone()
        }
    }
}
