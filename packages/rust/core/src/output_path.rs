//! Output path computation.
//!
//! Turns the `outputPath` family of options into the absolute path of the
//! compiled artifact. A templated `outputPath` may contain:
//!
//! - `{name}` / `$1`: the source file name without extension
//! - `{ext}` / `$2`: the artifact extension, dot included
//! - `${workspaceFolder}` / `${workspaceRoot}`: the workspace folder
//!
//! After expansion, a path ending in a separator is a folder (the default file
//! name is appended), a path without extension gets the extension appended,
//! and anything else is used as the file path itself. These two heuristics
//! disagree for folders whose name contains a dot (`dist/v1.0` is taken as a
//! file); write such folders with a trailing separator.

use std::path::{Component, Path, PathBuf};

use stylepress_shared::{CompileOptions, DEFAULT_EXTENSION, OutputPath};

/// Name of the source folder whose sub-structure `keepFolderStructure` mirrors.
const LESS_FOLDER: &str = "less";

/// Values substituted into an `outputPath` template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    /// Source file name without extension.
    pub name: &'a str,
    /// Artifact extension, dot included (may be empty).
    pub ext: &'a str,
    /// Workspace folder, when known.
    pub workspace_root: Option<&'a Path>,
}

/// Compute the absolute artifact path for `source_path`.
///
/// `options.output_path` must not be [`OutputPath::Disabled`]; the compiler
/// returns before calling this in that case (it is treated like unset here).
pub fn choose_output_path(
    options: &CompileOptions,
    source_path: &Path,
    source_dir: &Path,
    workspace_root: Option<&Path>,
) -> PathBuf {
    let ext = choose_extension(options);
    let name = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (base_dir, relative) = match &options.output_path {
        Some(OutputPath::Template(template)) => {
            let values = TemplateValues {
                name: &name,
                ext: &ext,
                workspace_root,
            };
            let mut relative = expand_template(template, &values);

            if options.keep_folder_structure() {
                let subfolders = subfolders_after_less(source_dir);
                if !subfolders.is_empty() {
                    relative = insert_subfolders(&relative, &subfolders);
                }
            }

            if is_folder(&relative) {
                relative = format!("{relative}{name}{ext}");
            } else if has_no_extension(&relative) {
                relative = format!("{relative}{ext}");
            }

            (source_dir.to_path_buf(), relative)
        }
        _ => {
            let dir = if options.same_base_with_css_folder() {
                source_dir.join("css")
            } else {
                source_dir.to_path_buf()
            };
            (dir, format!("{name}{ext}"))
        }
    };

    resolve_against(&base_dir, Path::new(&relative))
}

/// Path of the source map written next to `artifact`.
pub fn source_map_path(artifact: &Path) -> PathBuf {
    let mut path = artifact.as_os_str().to_owned();
    path.push(".map");
    PathBuf::from(path)
}

/// Relative path leading from directory `from` to `to`.
///
/// Both paths are made absolute first. Returns an empty path when they are
/// the same directory.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = resolve_against(Path::new(""), from);
    let to = resolve_against(Path::new(""), to);

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[common..] {
        relative.push(part);
    }
    relative
}

/// The artifact extension: `""` stays empty, other values get exactly one
/// leading dot, unset falls back to `.css`.
pub fn choose_extension(options: &CompileOptions) -> String {
    match options.output_extension.as_deref() {
        Some("") => String::new(),
        Some(ext) => ensure_dot_prefixed(ext),
        None => DEFAULT_EXTENSION.to_string(),
    }
}

fn ensure_dot_prefixed(ext: &str) -> String {
    format!(".{}", ext.trim_start_matches('.'))
}

/// Substitute named values into an `outputPath` template.
///
/// `{name}` and `{ext}` are replaced everywhere. The positional `$1` and `$2`
/// are replaced once each, in that order. Workspace variables are expanded
/// only when a workspace root is known and are otherwise left as written.
pub fn expand_template(template: &str, values: &TemplateValues<'_>) -> String {
    let mut out = template
        .replace("{name}", values.name)
        .replace("{ext}", values.ext)
        .replacen("$1", values.name, 1)
        .replacen("$2", values.ext, 1);

    if let Some(root) = values.workspace_root {
        let root = root.to_string_lossy();
        out = out
            .replace("${workspaceFolder}", &root)
            .replace("${workspaceRoot}", &root);
    }

    out
}

/// Folders of `dir` below its first `less` segment, joined with `/` and
/// ending in `/`. Empty when there is no `less` segment or it is the last.
pub fn subfolders_after_less(dir: &Path) -> String {
    let segments: Vec<String> = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let Some(index) = segments.iter().position(|s| s == LESS_FOLDER) else {
        return String::new();
    };

    let rest = &segments[index + 1..];
    if rest.is_empty() {
        return String::new();
    }

    format!("{}/", rest.join("/"))
}

/// Put `subfolders` under a folder path, or before the file name of a file
/// path. A path without extension names a folder.
fn insert_subfolders(path: &str, subfolders: &str) -> String {
    if is_folder(path) {
        return format!("{path}{subfolders}");
    }
    if has_no_extension(path) {
        return format!("{path}/{subfolders}");
    }

    match path.rfind(['/', '\\']) {
        Some(i) => format!("{}{subfolders}{}", &path[..=i], &path[i + 1..]),
        None => format!("{subfolders}{path}"),
    }
}

fn is_folder(path: &str) -> bool {
    path.ends_with('/') || path.ends_with('\\')
}

fn has_no_extension(path: &str) -> bool {
    Path::new(path).extension().is_none()
}

/// Join `path` onto `base` (unless already absolute), make it absolute and
/// fold `.` and `..` segments.
fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    let joined = base.join(path);
    let absolute = std::path::absolute(&joined).unwrap_or(joined);

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root.
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(out: &str) -> CompileOptions {
        CompileOptions {
            output_path: Some(OutputPath::Template(out.into())),
            ..Default::default()
        }
    }

    fn choose(options: &CompileOptions, source: &str) -> PathBuf {
        let source = Path::new(source);
        choose_output_path(options, source, source.parent().unwrap(), None)
    }

    #[test]
    fn unset_output_path_writes_next_to_source() {
        let options = CompileOptions::default();
        assert_eq!(
            choose(&options, "/proj/less/main.less"),
            PathBuf::from("/proj/less/main.css")
        );

        let options = CompileOptions {
            output_path: Some(OutputPath::SameDirectory),
            ..Default::default()
        };
        assert_eq!(
            choose(&options, "/proj/less/main.less"),
            PathBuf::from("/proj/less/main.css")
        );
    }

    #[test]
    fn same_base_with_css_folder() {
        let options = CompileOptions {
            same_base_with_css_folder: Some(true),
            ..Default::default()
        };
        assert_eq!(
            choose(&options, "/proj/styles/main.less"),
            PathBuf::from("/proj/styles/css/main.css")
        );
    }

    #[test]
    fn extension_rules() {
        let mut options = CompileOptions::default();
        assert_eq!(choose_extension(&options), ".css");

        options.output_extension = Some("wxss".into());
        assert_eq!(choose_extension(&options), ".wxss");

        options.output_extension = Some("..wxss".into());
        assert_eq!(choose_extension(&options), ".wxss");

        options.output_extension = Some(String::new());
        assert_eq!(choose_extension(&options), "");
        assert_eq!(
            choose(&options, "/proj/main.less"),
            PathBuf::from("/proj/main")
        );
    }

    #[test]
    fn relative_folder_template() {
        assert_eq!(
            choose(&template("../css/"), "/proj/less/main.less"),
            PathBuf::from("/proj/css/main.css")
        );
    }

    #[test]
    fn template_without_extension_gets_extension() {
        assert_eq!(
            choose(&template("../dist/bundle"), "/proj/less/main.less"),
            PathBuf::from("/proj/dist/bundle.css")
        );
    }

    #[test]
    fn literal_file_template() {
        assert_eq!(
            choose(&template("/out/site.min.css"), "/proj/less/main.less"),
            PathBuf::from("/out/site.min.css")
        );
    }

    #[test]
    fn positional_and_named_placeholders() {
        assert_eq!(
            choose(&template("/proj/dist/$1$2"), "/proj/less/styles.less"),
            PathBuf::from("/proj/dist/styles.css")
        );
        assert_eq!(
            choose(&template("/proj/dist/{name}.min{ext}"), "/proj/less/styles.less"),
            PathBuf::from("/proj/dist/styles.min.css")
        );
    }

    #[test]
    fn dotted_folder_without_separator_is_a_file() {
        // Known ambiguity: without a trailing separator `v1.0` looks like a file.
        assert_eq!(
            choose(&template("/proj/dist/v1.0"), "/proj/main.less"),
            PathBuf::from("/proj/dist/v1.0")
        );
        assert_eq!(
            choose(&template("/proj/dist/v1.0/"), "/proj/main.less"),
            PathBuf::from("/proj/dist/v1.0/main.css")
        );
    }

    #[test]
    fn workspace_variables() {
        let values = TemplateValues {
            name: "main",
            ext: ".css",
            workspace_root: Some(Path::new("/ws")),
        };
        assert_eq!(
            expand_template("${workspaceFolder}/dist/", &values),
            "/ws/dist/"
        );
        assert_eq!(expand_template("${workspaceRoot}/$1$2", &values), "/ws/main.css");

        let unresolved = TemplateValues {
            workspace_root: None,
            ..values
        };
        assert_eq!(
            expand_template("${workspaceFolder}/dist/", &unresolved),
            "${workspaceFolder}/dist/"
        );
    }

    #[test]
    fn workspace_variable_in_output_path() {
        let source = Path::new("/ws/less/main.less");
        let path = choose_output_path(
            &template("${workspaceFolder}/public/"),
            source,
            Path::new("/ws/less"),
            Some(Path::new("/ws")),
        );
        assert_eq!(path, PathBuf::from("/ws/public/main.css"));
    }

    #[test]
    fn subfolders_after_less_segment() {
        assert_eq!(subfolders_after_less(Path::new("/proj/less/foo")), "foo/");
        assert_eq!(
            subfolders_after_less(Path::new("/proj/less/foo/bar")),
            "foo/bar/"
        );
        assert_eq!(subfolders_after_less(Path::new("/proj/less")), "");
        assert_eq!(subfolders_after_less(Path::new("/proj/styles/foo")), "");
        // Only an exact segment match counts.
        assert_eq!(subfolders_after_less(Path::new("/proj/lesson/foo")), "");
    }

    #[test]
    fn keep_folder_structure_with_file_template() {
        let mut options = template("/proj/dist/$1$2");
        options.keep_folder_structure = Some(true);
        assert_eq!(
            choose(&options, "/proj/less/ui/styles.less"),
            PathBuf::from("/proj/dist/ui/styles.css")
        );
    }

    #[test]
    fn keep_folder_structure_with_folder_template() {
        let mut options = template("/proj/dist/");
        options.keep_folder_structure = Some(true);
        assert_eq!(
            choose(&options, "/proj/less/ui/forms/styles.less"),
            PathBuf::from("/proj/dist/ui/forms/styles.css")
        );
    }

    #[test]
    fn keep_folder_structure_with_extensionless_template() {
        let mut options = template("/proj/dist");
        options.keep_folder_structure = Some(true);
        assert_eq!(
            choose(&options, "/proj/less/ui/styles.less"),
            PathBuf::from("/proj/dist/ui/styles.css")
        );

        // Without subfolders the extension is appended as before.
        assert_eq!(
            choose(&options, "/proj/less/styles.less"),
            PathBuf::from("/proj/dist.css")
        );
    }

    #[test]
    fn both_folder_flags_with_template_follow_keep_structure() {
        let mut options = template("/proj/dist/");
        options.keep_folder_structure = Some(true);
        options.same_base_with_css_folder = Some(true);
        assert_eq!(
            choose(&options, "/proj/less/ui/styles.less"),
            PathBuf::from("/proj/dist/ui/styles.css")
        );
    }

    #[test]
    fn both_folder_flags_without_template_follow_same_base() {
        let options = CompileOptions {
            keep_folder_structure: Some(true),
            same_base_with_css_folder: Some(true),
            ..Default::default()
        };
        assert_eq!(
            choose(&options, "/proj/less/ui/styles.less"),
            PathBuf::from("/proj/less/ui/css/styles.css")
        );
    }

    #[test]
    fn relative_path_between_directories() {
        assert_eq!(
            relative_path(Path::new("/proj/css"), Path::new("/proj/less")),
            PathBuf::from("../less")
        );
        assert_eq!(
            relative_path(Path::new("/proj/dist/ui"), Path::new("/proj/less/ui")),
            PathBuf::from("../../less/ui")
        );
        assert_eq!(
            relative_path(Path::new("/proj/less/css"), Path::new("/proj/less")),
            PathBuf::from("..")
        );
        assert_eq!(
            relative_path(Path::new("/proj/less"), Path::new("/proj/less")),
            PathBuf::new()
        );
    }

    #[test]
    fn source_map_sits_next_to_artifact() {
        assert_eq!(
            source_map_path(Path::new("/proj/css/main.css")),
            PathBuf::from("/proj/css/main.css.map")
        );
    }
}
