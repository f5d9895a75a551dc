//! End-to-end `build` pipeline: plugins → merge → index → validate → package.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use docsetbuilder_plist::InfoPlist;
use docsetbuilder_shared::{BuildConfig, DocsetEntries, DocsetError, Result};
use docsetbuilder_storage::InsertStats;

use crate::assembler::{self, DocsetLayout};
use crate::entries::EntryStore;
use crate::index::{self, CapturedIndex};
use crate::manifest::ManifestAccumulator;
use crate::path::PathResolver;
use crate::plugin::{ContentIncluder, PluginContext, PluginDescriptor, TEMP_DIR_NAME, TempFolders};
use crate::validate;

/// Where a build currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Pending,
    /// Plugin `index` (0-based) is executing.
    Running { index: usize, plugin: String },
    Completed,
    Failed,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// The `<identifier>.docset` directory.
    pub docset_path: PathBuf,
    /// `dashIndexFilePath` written to the manifest.
    pub index_path: String,
    /// Typed entries after deduplication.
    pub entry_count: usize,
    /// Rows written to / ignored by the search index.
    pub search_rows: InsertStats,
    /// Distinct manifest keys contributed by plugins.
    pub manifest_keys: usize,
    /// References checked against the package contents.
    pub references: usize,
    pub dry_run: bool,
    pub elapsed: Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn state(&self, state: &BuildState);
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the build completes.
    fn done(&self, report: &BuildReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _state: &BuildState) {}
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &BuildReport) {}
}

/// Merged contributions of every plugin.
#[derive(Debug, Default)]
pub struct PluginRun {
    pub entries: DocsetEntries,
    pub manifest: ManifestAccumulator,
    /// Index claimed by the first eligible plugin.
    pub captured: Option<CapturedIndex>,
}

/// Run the full build.
///
/// 1. Reset the package directory
/// 2. Run plugins in order, merging entries and manifest additions
/// 3. Select the landing page
/// 4. Copy the raw docs tree
/// 5. Canonicalize and validate every reference
/// 6. Write the search index, manifest, and icons
///
/// Temp folders are removed whatever the outcome. On failure the partial
/// package is removed as well.
#[instrument(skip_all, fields(identifier = %config.identifier, plugins = plugins.len(), dry_run = config.dry_run))]
pub async fn build_docset(
    config: &BuildConfig,
    plugins: &[PluginDescriptor],
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();
    progress.state(&BuildState::Pending);

    let layout = DocsetLayout::new(&config.output_path, &config.identifier);
    info!(path = %layout.root.display(), "starting docset build");

    progress.phase("Preparing package");
    if let Err(e) = layout.reset().await {
        progress.state(&BuildState::Failed);
        return Err(e);
    }

    let temp = TempFolders::new(config.working_dir.join(TEMP_DIR_NAME));
    let includer = ContentIncluder::new(&layout.documents, config.dry_run);

    let result = assemble(config, plugins, &layout, &temp, &includer, progress).await;

    if let Err(e) = temp.cleanup().await {
        warn!(path = %temp.root().display(), error = %e, "failed to remove temp folders");
    }

    match result {
        Ok(mut report) => {
            report.elapsed = start.elapsed();
            info!(
                entries = report.entry_count,
                rows = report.search_rows.inserted,
                index = %report.index_path,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "docset build complete"
            );
            progress.state(&BuildState::Completed);
            progress.done(&report);
            Ok(report)
        }
        Err(e) => {
            warn!(error = %e, "docset build failed");
            progress.state(&BuildState::Failed);
            layout.discard().await;
            Err(e)
        }
    }
}

async fn assemble(
    config: &BuildConfig,
    plugins: &[PluginDescriptor],
    layout: &DocsetLayout,
    temp: &TempFolders,
    includer: &ContentIncluder,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let run = run_plugins(config, plugins, temp, includer, progress).await?;

    // --- Index selection ---
    let explicit = config.index_file_name.as_deref().filter(|n| !n.is_empty());
    let captured = run.captured.clone().or_else(|| {
        config
            .entries
            .index
            .as_deref()
            .map(CapturedIndex::from_raw)
    });
    let location = index::select(explicit, captured.as_ref());
    let base_dir = config.index_file_dir_path.as_deref();
    let index_path = location.path(base_dir);
    let resolver = PathResolver::new(location.file_name.clone(), base_dir);
    info!(index = %index_path, "landing page selected");

    // --- Raw docs tree ---
    if let Some(docs_path) = &config.docs_path {
        progress.phase("Copying documentation");
        assembler::copy_docs(layout, docs_path).await?;
    }

    // --- Canonicalize ---
    progress.phase("Resolving entries");
    let mut store = EntryStore::from_raw(&run.entries, &resolver);
    if let Some(raw) = run.entries.index.as_deref().or(explicit) {
        store.set_index(raw, index_path.as_str());
    }
    debug!(entries = store.len(), types = store.types().len(), "entries canonicalized");

    // --- Validate ---
    progress.phase("Validating references");
    let references = validate::validate(&store, &layout.documents, &index_path)?;

    // --- Write package ---
    progress.phase("Writing search index");
    let search_rows = assembler::write_search_index(layout, store.entries()).await?;

    progress.phase("Writing manifest");
    let manifest_keys = run.manifest.len();
    let plist = InfoPlist {
        identifier: config.identifier.clone(),
        name: config.name.clone(),
        platform_family: config.platform_family.clone(),
        index_file_path: index_path.clone(),
        javascript_enabled: config.is_javascript_enabled,
        fallback_url: config.fallback_url.clone(),
        additions: run.manifest.into_fields(),
    };
    assembler::write_manifest(layout, &plist)?;

    if let Some(icons_path) = &config.icons_path {
        assembler::copy_icons(layout, icons_path).await?;
    }

    Ok(BuildReport {
        docset_path: layout.root.clone(),
        index_path,
        entry_count: store.len(),
        search_rows,
        manifest_keys,
        references: references.len(),
        dry_run: config.dry_run,
        elapsed: Duration::ZERO,
    })
}

/// Execute every plugin in order and merge what they return.
pub async fn run_plugins(
    config: &BuildConfig,
    plugins: &[PluginDescriptor],
    temp: &TempFolders,
    includer: &ContentIncluder,
    progress: &dyn ProgressReporter,
) -> Result<PluginRun> {
    let mut run = PluginRun {
        entries: config.entries.clone(),
        ..PluginRun::default()
    };
    let index_fixed = config
        .index_file_name
        .as_deref()
        .is_some_and(|n| !n.is_empty());

    for (i, descriptor) in plugins.iter().enumerate() {
        let name = descriptor.name().to_string();
        progress.state(&BuildState::Running {
            index: i,
            plugin: name.clone(),
        });
        progress.phase(&format!("Running plugin {name}"));
        info!(plugin = %name, position = i + 1, total = plugins.len(), "running plugin");

        let ctx = PluginContext {
            cli_args: &config.cli_args,
            plugin_options: &descriptor.options,
            main_options: config,
            working_dir: &config.working_dir,
            temp,
            includer,
        };

        let output = descriptor.plugin.execute(&ctx).await.map_err(|e| match e {
            DocsetError::PluginExecution { .. } => e,
            other => DocsetError::plugin(&name, other.to_string()),
        })?;

        let eligible = descriptor.use_as_index || plugins.len() == 1;
        if eligible && !index_fixed && run.captured.is_none() {
            if let Some(raw) = output.entries.index.as_deref() {
                let captured = CapturedIndex::from_raw(raw);
                debug!(plugin = %name, ?captured, "index captured");
                run.captured = Some(captured);
            }
        }

        debug!(plugin = %name, entries = output.entries.len(), "merging plugin output");
        run.entries.merge(&output.entries);
        if let Some(fragment) = &output.manifest {
            run.manifest.add_fragment(fragment);
        }
    }

    Ok(run)
}
