use once_cell::sync::Lazy;
use regex::Regex;

#[cfg(windows)]
static SITE_PACKAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*lib/(?:site|dist)-packages.*").expect("site-packages pattern is valid")
});

#[cfg(not(windows))]
static SITE_PACKAGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r".*lib/python[^/]+/(?:site|dist)-packages.*").expect("site-packages pattern is valid")
});

/// 判斷路徑是否為直譯器管理的套件目錄。 / Whether `path` is an interpreter package directory.
///
/// `site-packages` and `dist-packages` directories are never offered as
/// search paths.
pub fn is_site_packages(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    SITE_PACKAGES
        .find(&normalized)
        .is_some_and(|found| found.start() == 0)
}
