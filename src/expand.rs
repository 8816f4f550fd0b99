//! Deferred bareword expansion with a single-slot, environment-keyed
//! cache.
//!
//! Tilde and wildcard expansion both depend on state that can change
//! between two uses of the same AST node: the acting user and the
//! working directory. Each [`Bareword`] therefore memoizes its last
//! expansion together with a snapshot of both, and recomputes whenever
//! either no longer matches. The check is two equality comparisons; it
//! runs on every use.

use std::io;
use std::path::{Path, PathBuf};

use crate::ast::Bareword;

/// Host state consulted during expansion. Implemented on the real
/// process environment by [`SystemEnvironment`]; tests substitute their
/// own to simulate user or directory changes.
pub trait Environment {
    /// Name of the acting user.
    fn current_user(&self) -> String;

    /// Current working directory.
    fn working_dir(&self) -> PathBuf;

    /// Home directory of `user`, if known.
    fn home_dir(&self, user: &str) -> Option<PathBuf>;

    /// Entry names of a directory, used for wildcard matching.
    ///
    /// # Errors
    ///
    /// I/O errors for unreadable or missing directories; the caller
    /// treats those as "no matches here".
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<String>>;
}

/// [`Environment`] backed by the process environment and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn current_user(&self) -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_default()
    }

    fn working_dir(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn home_dir(&self, user: &str) -> Option<PathBuf> {
        if user == self.current_user() {
            std::env::var_os("HOME").map(PathBuf::from)
        } else {
            Some(Path::new("/home").join(user))
        }
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// Last expansion plus the environment it was computed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExpansionSnapshot {
    pub(crate) value: String,
    pub(crate) user: String,
    pub(crate) working_dir: PathBuf,
}

impl Bareword {
    /// The word's textual value.
    ///
    /// Returns the raw text unchanged when no expansion marker is set.
    /// Otherwise returns the cached expansion if the recorded user and
    /// working directory still match `env`, and recomputes (replacing
    /// the cache slot) on any mismatch. Wildcard matches are sorted and
    /// joined with single spaces; a pattern with no matches is returned
    /// as written.
    #[must_use]
    pub fn value(&self, env: &dyn Environment) -> String {
        if !self.needs_tilde && !self.needs_wildcard {
            return self.raw.clone();
        }
        let user = env.current_user();
        let working_dir = env.working_dir();
        {
            let cache = self.cache.borrow();
            if let Some(hit) = cache.as_ref()
                && hit.user == user
                && hit.working_dir == working_dir
            {
                return hit.value.clone();
            }
        }
        log::debug!("expanding bareword {:?} for {user}", self.raw);
        let value = self.expand(env, &working_dir);
        *self.cache.borrow_mut() = Some(ExpansionSnapshot {
            value: value.clone(),
            user,
            working_dir,
        });
        value
    }

    fn expand(&self, env: &dyn Environment, working_dir: &Path) -> String {
        let mut text = self.raw.clone();
        if self.needs_tilde {
            text = expand_tilde(&text, env);
        }
        if self.needs_wildcard {
            text = expand_wildcards(&text, env, working_dir);
        }
        text
    }
}

/// Replace a leading `~` or `~user` with the matching home directory.
/// An unknown user leaves the word as written.
fn expand_tilde(word: &str, env: &dyn Environment) -> String {
    debug_assert!(word.starts_with('~'));
    let rest = &word[1..];
    let (user, suffix) = rest
        .find('/')
        .map_or((rest, ""), |idx| (&rest[..idx], &rest[idx..]));
    let home = if user.is_empty() {
        env.home_dir(&env.current_user())
    } else {
        env.home_dir(user)
    };
    home.map_or_else(
        || word.to_string(),
        |home| format!("{}{suffix}", home.display()),
    )
}

/// Glob `*` across path segments, listing directories through the
/// environment. Matches keep the written path shape (relative patterns
/// produce relative paths) and are returned sorted, space-joined.
fn expand_wildcards(pattern: &str, env: &dyn Environment, working_dir: &Path) -> String {
    let absolute = pattern.starts_with('/');
    let root = if absolute {
        PathBuf::from("/")
    } else {
        working_dir.to_path_buf()
    };
    // (filesystem path, text as it will be printed)
    let mut candidates = vec![(root, String::new())];

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let mut next = Vec::new();
        if segment.contains('*') {
            for (dir, text) in &candidates {
                let Ok(mut names) = env.read_dir(dir) else {
                    continue;
                };
                names.sort_unstable();
                for name in names {
                    // A wildcard never matches hidden entries unless
                    // the pattern itself starts with a dot.
                    if name.starts_with('.') && !segment.starts_with('.') {
                        continue;
                    }
                    if wildcard_match(segment, &name) {
                        next.push((dir.join(&name), join_text(text, &name, absolute)));
                    }
                }
            }
        } else {
            for (dir, text) in &candidates {
                let Ok(names) = env.read_dir(dir) else {
                    continue;
                };
                if names.iter().any(|n| n == segment) {
                    next.push((dir.join(segment), join_text(text, segment, absolute)));
                }
            }
        }
        candidates = next;
    }

    let mut matches: Vec<String> = candidates.into_iter().map(|(_, text)| text).collect();
    matches.sort_unstable();
    matches.dedup();
    if matches.is_empty() {
        pattern.to_string()
    } else {
        matches.join(" ")
    }
}

fn join_text(prefix: &str, name: &str, absolute: bool) -> String {
    if prefix.is_empty() {
        if absolute {
            format!("/{name}")
        } else {
            name.to_string()
        }
    } else {
        format!("{prefix}/{name}")
    }
}

/// Match `pattern` against `name` where `*` matches any run of
/// characters (including none). Iterative two-pointer scan with
/// backtracking to the most recent star.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = name.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let (mut star_pi, mut star_ti) = (usize::MAX, usize::MAX);

    while ti < txt.len() {
        if pi < pat.len() && pat[pi] == '*' {
            star_pi = pi;
            star_ti = ti;
            pi += 1;
        } else if pi < pat.len() && pat[pi] == txt[ti] {
            pi += 1;
            ti += 1;
        } else if star_pi != usize::MAX {
            pi = star_pi + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pat.len() && pat[pi] == '*' {
        pi += 1;
    }
    pi == pat.len()
}
