use recce_state_core::api::{
    AppConfig, LoaderOptions, StateError, StateLoader, StorageBackend, StorageKind,
    LocalFileBackend,
};

use crate::storage::{CloudApiBackend, ObjectStoreBackend};

/// Fills cloud options the caller left unset from process configuration.
pub fn resolve_options(mut options: LoaderOptions, cfg: &AppConfig) -> LoaderOptions {
    if options.cloud.host.is_none() {
        options.cloud.host = cfg.state_host.clone();
    }
    if options.cloud.token.is_none() {
        options.cloud.token = cfg.cloud.token.clone();
    }
    options
}

pub fn build_storage(
    kind: &StorageKind,
    options: &LoaderOptions,
    cfg: &AppConfig,
) -> Result<Box<dyn StorageBackend>, StateError> {
    Ok(match kind {
        StorageKind::LocalFile(path) => Box::new(LocalFileBackend::new(path.clone())),
        StorageKind::CloudApi => Box::new(CloudApiBackend::new(
            &cfg.cloud.api_host,
            options.cloud.token.clone(),
            cfg.cloud.timeout_ms,
        )?),
        StorageKind::ObjectStore { bucket } => {
            Box::new(ObjectStoreBackend::new(bucket.clone(), &cfg.object_store)?)
        }
    })
}

/// Resolves the backend once and hands back an unloaded loader.
pub fn build_state_loader(
    options: LoaderOptions,
    cfg: &AppConfig,
) -> Result<StateLoader, StateError> {
    let options = resolve_options(options, cfg);
    let backend = match StorageKind::resolve(&options) {
        Some(kind) => {
            tracing::debug!(
                target: "recce.state",
                stage = "factory.storage",
                kind = kind.as_str()
            );
            Some(build_storage(&kind, &options, cfg)?)
        }
        None => None,
    };
    Ok(StateLoader::new(options, backend))
}

/// [`build_state_loader`] followed by a best-effort load.
pub async fn open_state_loader(
    options: LoaderOptions,
    cfg: &AppConfig,
) -> Result<StateLoader, StateError> {
    let mut loader = build_state_loader(options, cfg)?;
    loader.load().await;
    Ok(loader)
}
