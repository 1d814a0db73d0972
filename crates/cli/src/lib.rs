//! Shared setup for the deck command-line tools.

pub mod assemble;
pub mod plan;

pub use assemble::AssembleArgs;
pub use plan::PlanArgs;

use deck_core::policy::{ARCHITECTURE_DECK_FILE, GENERAL_DECK_FILES};
use deck_pptx::{Presentation, ReferenceDecks};
use std::path::{Path, PathBuf};

/// Directory name searched for reference decks when none is given.
pub const REFERENCE_DIR_NAME: &str = "ref";

/// Initialize env_logger. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// The reference-deck directory: `explicit` if given, else `ref` next to the
/// executable, else `ref` one directory above it.
pub fn reference_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    default_reference_dir(&exe_dir)
}

fn default_reference_dir(exe_dir: &Path) -> PathBuf {
    let beside = exe_dir.join(REFERENCE_DIR_NAME);
    if beside.is_dir() {
        return beside;
    }
    exe_dir
        .parent()
        .map(|parent| parent.join(REFERENCE_DIR_NAME))
        .filter(|above| above.is_dir())
        .unwrap_or(beside)
}

pub fn architecture_deck_path(ref_dir: &Path) -> Option<PathBuf> {
    Some(ref_dir.join(ARCHITECTURE_DECK_FILE)).filter(|path| path.is_file())
}

/// The first general deck name that exists in `ref_dir`.
pub fn general_deck_path(ref_dir: &Path) -> Option<PathBuf> {
    GENERAL_DECK_FILES
        .iter()
        .map(|name| ref_dir.join(name))
        .find(|path| path.is_file())
}

/// Open whichever reference decks are present. Missing or unreadable decks
/// are logged and left out.
pub fn load_references(ref_dir: &Path) -> ReferenceDecks {
    ReferenceDecks {
        architecture: open_reference("architecture", architecture_deck_path(ref_dir)),
        general: open_reference("general", general_deck_path(ref_dir)),
    }
}

fn open_reference(kind: &str, path: Option<PathBuf>) -> Option<Presentation> {
    let Some(path) = path else {
        log::warn!("No {} reference deck found", kind);
        return None;
    };
    match Presentation::open(&path) {
        Ok(deck) => {
            log::debug!(
                "Loaded {} reference deck {} ({} slides)",
                kind,
                path.display(),
                deck.slide_count()
            );
            Some(deck)
        }
        Err(e) => {
            log::warn!("Could not open {} reference deck {}: {}", kind, path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_reference_dir() {
        assert_eq!(
            reference_dir(Some(Path::new("/srv/decks"))),
            PathBuf::from("/srv/decks")
        );
    }

    #[test]
    fn test_reference_dir_next_to_or_above_exe() {
        let root = tempfile::tempdir().unwrap();
        let bin = root.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();

        std::fs::create_dir_all(root.path().join("ref")).unwrap();
        assert_eq!(default_reference_dir(&bin), root.path().join("ref"));

        std::fs::create_dir_all(bin.join("ref")).unwrap();
        assert_eq!(default_reference_dir(&bin), bin.join("ref"));
    }

    #[test]
    fn test_general_deck_fallback_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(general_deck_path(dir.path()), None);

        std::fs::write(dir.path().join("Available _Slide.pptx"), b"").unwrap();
        assert_eq!(
            general_deck_path(dir.path()),
            Some(dir.path().join("Available _Slide.pptx"))
        );

        std::fs::write(dir.path().join("AvailableSlide11.pptx"), b"").unwrap();
        assert_eq!(
            general_deck_path(dir.path()),
            Some(dir.path().join("AvailableSlide11.pptx"))
        );
    }

    #[test]
    fn test_unreadable_reference_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ARCHITECTURE_DECK_FILE), b"not a zip").unwrap();

        let refs = load_references(dir.path());
        assert!(refs.architecture.is_none());
        assert!(refs.general.is_none());
    }
}
