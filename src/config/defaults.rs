//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// [layout] Section Defaults
// ============================================================================

pub mod layout {
    use std::path::PathBuf;

    pub fn notes() -> PathBuf {
        "source/notes".into()
    }

    pub fn staging() -> PathBuf {
        "source/cache".into()
    }

    pub fn template() -> PathBuf {
        "source/index.template.md".into()
    }

    pub fn index() -> PathBuf {
        "source/index.md".into()
    }

    pub fn output() -> PathBuf {
        "docs".into()
    }

    pub fn marker() -> String {
        ".nojekyll".into()
    }
}

// ============================================================================
// [builder] Section Defaults
// ============================================================================

pub mod builder {
    use std::path::PathBuf;

    pub fn command() -> Vec<String> {
        vec!["make".into(), "html".into()]
    }

    pub fn html() -> PathBuf {
        "build/html".into()
    }

    pub fn build_dir() -> PathBuf {
        "build".into()
    }
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    pub fn remote() -> String {
        "origin".into()
    }

    pub fn branch() -> String {
        "main".into()
    }

    pub fn pty() -> bool {
        false
    }
}
