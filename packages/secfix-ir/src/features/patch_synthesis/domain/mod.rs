pub mod guard;
pub mod pending_fix;
pub mod template;

pub use guard::{guard_template, GuardVariant, ThrownException, BAD_ZIP_ENTRY};
pub use pending_fix::{
    Extraction, FixKind, FixKindTag, GuardFix, PendingFix, PendingFixes, Replacement,
    PENDING_FIXES_KEY,
};
pub use template::{Fragment, SourceTemplate, TemplateError, TemplateParam};
