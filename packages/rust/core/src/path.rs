//! Canonical, package-relative addressing for plugin-reported paths.
//!
//! Plugins report paths in whatever shape their source uses (`api\Foo.html`,
//! `/guide/`, `dir/#anchor`). [`PathResolver::normalize`] maps all of them onto
//! one form: `/` separators, no leading root, directories expanded to their
//! index page, and relative paths anchored at the configured base directory.

/// Normalizes raw entry paths for one build.
#[derive(Debug, Clone)]
pub struct PathResolver {
    index_file_name: String,
    base_dir: Option<String>,
}

impl PathResolver {
    /// `base_dir` is the configured index directory; empty means none.
    pub fn new(index_file_name: impl Into<String>, base_dir: Option<&str>) -> Self {
        let base_dir = base_dir
            .map(|d| d.replace('\\', "/"))
            .filter(|d| !d.trim_matches('/').is_empty() && d != ".");
        Self {
            index_file_name: index_file_name.into(),
            base_dir,
        }
    }

    pub fn index_file_name(&self) -> &str {
        &self.index_file_name
    }

    pub fn base_dir(&self) -> Option<&str> {
        self.base_dir.as_deref()
    }

    /// Map a raw path onto its canonical package-relative form.
    ///
    /// 1. `dir/#frag` and `dir\#frag` collapse to `dir#frag`
    /// 2. `\` becomes `/`
    /// 3. a trailing `/` gets the index file name appended
    /// 4. paths not starting with `./` or `/` are joined onto the base dir
    ///    (when one is configured) and `.`/`..` segments are collapsed
    /// 5. leading `/` is stripped
    ///
    /// A bare `#fragment` is returned unchanged; the validator resolves it
    /// against the index page.
    ///
    /// Normalizing an already normalized path is a no-op only when no base
    /// dir is set. With a base dir the result is joined onto it again.
    pub fn normalize(&self, raw: &str) -> String {
        let mut path = collapse_anchor_separator(&raw.replace('\\', "/"));

        if path.ends_with('/') {
            path.push_str(&self.index_file_name);
        }

        if let Some(base) = &self.base_dir {
            if !path.starts_with('/') && !path.starts_with("./") && !path.starts_with('#') {
                path = join_collapsed(base, &path);
            }
        }

        path.trim_start_matches('/').to_string()
    }
}

/// Split `page#anchor` into the page and the anchor (without `#`).
pub fn split_anchor(path: &str) -> (&str, Option<&str>) {
    match path.split_once('#') {
        Some((page, anchor)) => (page, Some(anchor)),
        None => (path, None),
    }
}

/// Drop separators sitting directly before the first `#`.
fn collapse_anchor_separator(path: &str) -> String {
    match path.split_once('#') {
        Some((page, anchor)) if page.ends_with('/') => {
            format!("{}#{anchor}", page.trim_end_matches('/'))
        }
        _ => path.to_string(),
    }
}

/// Join `rel` onto `base` and resolve `.`/`..` in the page part. The
/// anchor, if any, is carried over untouched.
fn join_collapsed(base: &str, rel: &str) -> String {
    let (page, anchor) = split_anchor(rel);
    let absolute = base.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(page.split('/')) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }

    let mut joined = segments.join("/");
    if absolute {
        joined.insert(0, '/');
    }
    if let Some(anchor) = anchor {
        joined.push('#');
        joined.push_str(anchor);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> PathResolver {
        PathResolver::new("index.html", None)
    }

    #[test]
    fn directory_gets_index_page() {
        assert_eq!(plain().normalize("docs/"), "docs/index.html");
        assert_eq!(plain().normalize("/"), "index.html");
        assert_eq!(plain().normalize("docs\\api\\"), "docs/api/index.html");
    }

    #[test]
    fn anchor_after_separator_collapses() {
        assert_eq!(plain().normalize("guide/#section"), "guide#section");
        assert_eq!(plain().normalize("guide\\#section"), "guide#section");
        assert_eq!(plain().normalize("a.html#x/#y"), "a.html#x/#y");
    }

    #[test]
    fn separators_and_root_stripped() {
        assert_eq!(plain().normalize("\\api\\Foo.html"), "api/Foo.html");
        assert_eq!(plain().normalize("//api/Foo.html"), "api/Foo.html");
        assert_eq!(plain().normalize("./api/Foo.html"), "./api/Foo.html");
    }

    #[test]
    fn bare_anchor_left_for_validator() {
        assert_eq!(plain().normalize("#top"), "#top");
        let based = PathResolver::new("index.html", Some("api"));
        assert_eq!(based.normalize("#top"), "#top");
    }

    #[test]
    fn relative_paths_join_base_dir() {
        let based = PathResolver::new("index.html", Some("api"));
        assert_eq!(based.normalize("Foo.html"), "api/Foo.html");
        assert_eq!(based.normalize("../guide/intro.html"), "guide/intro.html");
        assert_eq!(based.normalize("./Foo.html"), "./Foo.html");
        assert_eq!(based.normalize("/Foo.html"), "Foo.html");
        assert_eq!(based.normalize("sub/"), "api/sub/index.html");
        assert_eq!(based.normalize("x/./y/../Foo.html#a/../b"), "api/x/Foo.html#a/../b");
        assert_eq!(based.normalize(&based.normalize("Foo.html")), "api/api/Foo.html");
    }

    #[test]
    fn base_dir_variants() {
        assert!(PathResolver::new("index.html", Some("")).base_dir().is_none());
        assert!(PathResolver::new("index.html", Some(".")).base_dir().is_none());

        let windows = PathResolver::new("index.html", Some("docs\\api"));
        assert_eq!(windows.normalize("Foo.html"), "docs/api/Foo.html");

        let above = PathResolver::new("index.html", Some("api"));
        assert_eq!(above.normalize("../../x.html"), "../x.html");
    }

    #[test]
    fn normalize_is_idempotent_without_base_dir() {
        let resolver = plain();
        let inputs = [
            "",
            "/",
            "docs/",
            "guide/#section",
            "guide\\#section",
            "a//#b",
            "a/#b/#c",
            "\\\\x\\y.html",
            "//root.html",
            "./rel.html",
            "#top",
            "/#top",
            "dir/sub/",
            "a.html#frag/",
        ];
        for input in inputs {
            let once = resolver.normalize(input);
            assert_eq!(resolver.normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn split_anchor_parts() {
        assert_eq!(split_anchor("a.html#top"), ("a.html", Some("top")));
        assert_eq!(split_anchor("a.html"), ("a.html", None));
        assert_eq!(split_anchor("#top"), ("", Some("top")));
    }
}
