use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info, warn};

use fabricscale_core::FabricScaleConfig;
use fabricscale_nodeinfo::{
    FabricNodeInfoProvider, LabelNodeGroupResolver, Node, StaticTemplateProvider, TaintConfig,
    TemplateNodeInfoProvider, TemplateSet, sort_nodes_by_name,
};
use fabricscale_state::{RecordStore, StateStore, StatusRecord};
use fabricscale_status::{
    ConfigmapScaleUpStatusProcessor, EventType, LAST_UPDATED_ANNOTATION, STATUS_DATA_KEY,
    ScaleUpResult, ScaleUpStatus, ScaleUpStatusProcessor, StatusContext, StatusWriter, aggregate,
};

pub fn open_store(config: &FabricScaleConfig) -> anyhow::Result<StateStore> {
    std::fs::create_dir_all(&config.store.data_dir)?;
    let db_path = config.store.data_dir.join("fabricscale.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");
    Ok(store)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Run the fabric attribution pass over JSON inputs and render the result
/// as pretty JSON, keyed by node group in name order.
pub fn templates(
    config: &FabricScaleConfig,
    nodes_path: &Path,
    templates_path: &Path,
    sort: bool,
) -> anyhow::Result<String> {
    let mut nodes: Vec<Node> = read_json(nodes_path)?;
    let base: TemplateSet = read_json(templates_path)?;
    if sort {
        sort_nodes_by_name(&mut nodes);
    }

    let resolver = LabelNodeGroupResolver::new(config.fabric.node_group_label.as_str());
    let mut provider = FabricNodeInfoProvider::with_label_key(
        Box::new(StaticTemplateProvider::new(base)),
        config.fabric.label_key.as_str(),
    );
    let result = provider.process(&resolver, &nodes, &[], &TaintConfig::default(), Utc::now());
    provider.clean_up();

    let ordered: BTreeMap<_, _> = result?.into_iter().collect();
    Ok(serde_json::to_string_pretty(&ordered)?)
}

/// Aggregate and persist one attempt, returning the stored record.
pub fn report(
    config: &FabricScaleConfig,
    store: &dyn RecordStore,
    attempt_path: &Path,
) -> anyhow::Result<StatusRecord> {
    let attempt: ScaleUpStatus = read_json(attempt_path)?;
    let mut report = aggregate(&attempt);
    let name = config.status.scale_up_record_name();
    let record = StatusWriter::new(store, config.status.namespace.as_str())
        .with_max_attempts(config.status.max_write_attempts)
        .write(&mut report, None, &name, Utc::now())
        .with_context(|| format!("publishing scale-up status to {name}"))?;
    info!(
        record = %name,
        version = record.version,
        result = %report.result,
        "scale-up status published"
    );
    Ok(record)
}

/// Republish the attempt file every `report_interval_secs` until Ctrl-C.
pub async fn run(
    config: FabricScaleConfig,
    store: StateStore,
    attempt_path: PathBuf,
) -> anyhow::Result<()> {
    let interval = Duration::from_secs(config.status.report_interval_secs.max(1));
    let mut ctx = StatusContext::new(Arc::new(store), config.status.clone());
    let mut processor = ConfigmapScaleUpStatusProcessor;
    info!(interval_secs = interval.as_secs(), "status reporter started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let attempt: ScaleUpStatus = match read_json(&attempt_path) {
                    Ok(attempt) => attempt,
                    Err(e) => {
                        warn!(error = %e, "skipping cycle, attempt unreadable");
                        continue;
                    }
                };
                processor.process(&mut ctx, &attempt, Utc::now());
                if attempt.result == ScaleUpResult::Error {
                    ctx.recorder.event(
                        EventType::Warning,
                        "ScaleUpFailed",
                        "last scale-up attempt ended in error",
                    );
                }
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!(error = %e, "failed to listen for shutdown signal");
                }
                info!("status reporter shutting down");
                break;
            }
        }
    }

    processor.clean_up();
    Ok(())
}

/// Render the persisted scale-up status record.
pub fn status(config: &FabricScaleConfig, store: &StateStore) -> anyhow::Result<String> {
    let name = config.status.scale_up_record_name();
    let record = store.get_record(&config.status.namespace, &name)?;
    let last_updated = record
        .annotations
        .get(LAST_UPDATED_ANNOTATION)
        .map(String::as_str)
        .unwrap_or("never");
    let body = record
        .data
        .get(STATUS_DATA_KEY)
        .map(String::as_str)
        .unwrap_or_default();
    Ok(format!(
        "record: {}/{} (version {})\nlast updated: {last_updated}\n{body}",
        record.namespace, record.name, record.version
    ))
}
