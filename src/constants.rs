//! Common constants used throughout the fheforge application.

/// Supported metadata document names, tried in order
pub const METADATA_FILES: [&str; 3] = ["forge.json", "forge.yml", "forge.yaml"];

/// Ignore file consulted when copying the shared project skeleton
pub const IGNORE_FILE: &str = ".forgeignore";

/// Subdirectory of the template store holding base templates
pub const BASES_DIR: &str = "bases";

/// Subdirectory of the template store holding modules
pub const MODULES_DIR: &str = "modules";

/// Subdirectory of the template store holding the shared project skeleton
pub const SKELETON_DIR: &str = "skeleton";

/// Advisory ceiling for summed size estimates, in bytes (EIP-170
/// deployed-bytecode limit).
pub const SIZE_CEILING: u64 = 24_576;

/// Pairs of semantic tags that cannot be combined in one contract.
/// A tag paired with itself means at most one module may carry it.
pub const SEMANTIC_CONFLICTS: [(&str, &str); 4] = [
    ("access-control", "access-control"),
    ("pausing", "pausing"),
    ("decryption-oracle", "decryption-oracle"),
    ("public-decryption", "reencryption"),
];
