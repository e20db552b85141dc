//! The patch safety core: schema parsing, policy gates, baseline hashes,
//! rollback, application and the supporting history and preview views.

pub mod applier;
pub mod hash_cache;
pub mod history;
pub mod policy;
pub mod preview;
pub mod rollback;
pub mod schema;

pub use applier::{ApplyResult, PatchApplier};
pub use hash_cache::{sha256_hex, FileHashCache};
pub use history::{PatchHistory, PatchHistoryEntry};
pub use policy::{resolve_target, validate_patch, Gate, PolicyValidator, ValidationResult};
pub use preview::{preview_patches, render_line_diff, FilePreview};
pub use rollback::{RollbackEntry, RollbackStack, UndoResult};
pub use schema::{load_payloads, parse_patch, validate_patch_schema, Patch};
