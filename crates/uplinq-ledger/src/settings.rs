//! Platform settings access.
//!
//! Settings are loaded once per operation invocation, inside the
//! operation's own transaction, and passed down as a value. No ambient
//! caching: a racing admin update either lands before the snapshot or
//! conflicts the commit.

use shared_types::{CoreError, CoreResult, PlatformSettings};
use uplinq_store::{collections, DocumentStore, Txn};

/// Load the settings singleton, falling back to defaults when the
/// platform has not been configured yet.
pub fn load_settings<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
) -> CoreResult<PlatformSettings> {
    Ok(txn
        .get::<PlatformSettings>(collections::PLATFORM_SETTINGS, collections::SINGLETON_DOC)?
        .unwrap_or_default())
}

/// Reject money-moving operations while the platform is in maintenance.
pub fn ensure_not_maintenance(settings: &PlatformSettings) -> CoreResult<()> {
    if settings.maintenance_mode {
        return Err(CoreError::PreconditionFailed(
            "platform is under maintenance".into(),
        ));
    }
    Ok(())
}
