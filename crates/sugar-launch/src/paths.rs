use std::{
    ffi::OsString,
    path::{is_separator, Path, PathBuf, MAIN_SEPARATOR_STR},
};

use path_clean::PathClean;

pub const OUTPUT_ROOT: &str = "output";
pub const VANILLA_GS_DIR: &str = "vanilla_gs";
/// Written by the vanilla 3DGS trainer once a run has finished.
pub const CHECKPOINT_MARKER: &str = "cameras.json";

/// Last component of the scene path, ignoring trailing separators and `.` parts.
///
/// `None` when there is no such component or it isn't valid UTF-8.
pub fn scene_name(scene_path: &Path) -> Option<String> {
    scene_path
        .clean()
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
}

pub fn default_output_dir(scene_name: &str) -> PathBuf {
    Path::new(OUTPUT_ROOT).join(scene_name)
}

pub fn default_checkpoint_dir(scene_name: &str) -> PathBuf {
    Path::new(OUTPUT_ROOT).join(VANILLA_GS_DIR).join(scene_name)
}

/// The coarse trainers build file names by plain string concatenation, so the
/// checkpoint directory has to end in a separator.
pub fn with_trailing_separator(path: PathBuf) -> PathBuf {
    let mut raw: OsString = if path.as_os_str().is_empty() {
        OsString::from(".")
    } else {
        path.into_os_string()
    };

    if !raw.to_string_lossy().ends_with(is_separator) {
        raw.push(MAIN_SEPARATOR_STR);
    }
    PathBuf::from(raw)
}

/// Does the directory look like something the trainers can read?
pub fn looks_like_scene(scene_dir: &Path) -> bool {
    let sparse = scene_dir.join("sparse").join("0");
    sparse.join("cameras.bin").is_file()
        || sparse.join("cameras.txt").is_file()
        || scene_dir.join("transforms_train.json").is_file()
}
