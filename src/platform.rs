//! Host platform capabilities, computed once and consumed as plain data.
//!
//! Everything that differs between operating systems (separators, path case
//! rules, where the AWS CLI may live, which variables a child process keeps)
//! is gathered into a single [`Platform`] value. The rest of the crate never
//! branches on `cfg!(target_os)` itself.

use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    MacOs,
    Windows,
    /// Linux and every other Unix-like system.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub family: OsFamily,
    /// Separator between path components.
    pub path_separator: char,
    /// Separator between entries of a `PATH`-style list.
    pub path_list_separator: char,
    pub case_insensitive_paths: bool,
    /// Program used to locate an executable by name (`which` / `where`).
    pub locate_program: &'static str,
    pub aws_executable: &'static str,
    /// Directories making up the sanitized search path, in lookup order.
    pub search_dirs: &'static [&'static str],
    /// Install roots an AWS CLI binary (and its symlink target) must live under.
    pub trusted_prefixes: &'static [&'static str],
    /// Variables copied from the parent environment into the login process.
    pub env_allow_list: &'static [&'static str],
}

const UNIX_SEARCH_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/usr/bin",
    "/bin",
    "/usr/sbin",
    "/sbin",
    "/opt/homebrew/bin",
    "/home/linuxbrew/.linuxbrew/bin",
    "/snap/bin",
    "/usr/local/aws-cli/v2/current/bin",
];

const UNIX_TRUSTED_PREFIXES: &[&str] = &[
    "/usr/bin",
    "/usr/local/bin",
    "/bin",
    // Official AWS CLI v2 installer
    "/usr/local/aws-cli",
    // Homebrew (Apple Silicon, Intel, Linux)
    "/opt/homebrew",
    "/usr/local/Cellar",
    "/home/linuxbrew/.linuxbrew",
    "/snap",
    // Distribution packages install the real entry point here
    "/usr/lib",
    "/usr/libexec",
    "/usr/local/lib",
    "/usr/share",
];

const UNIX_ENV_ALLOW_LIST: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "TERM",
    "LANG",
    "DISPLAY",
    "WAYLAND_DISPLAY",
    "XDG_RUNTIME_DIR",
];

const WINDOWS_SEARCH_DIRS: &[&str] = &[
    r"C:\Program Files\Amazon\AWSCLIV2",
    r"C:\Program Files (x86)\Amazon\AWSCLIV2",
    r"C:\Windows\System32",
];

const WINDOWS_TRUSTED_PREFIXES: &[&str] = &[
    r"C:\Program Files\Amazon\AWSCLIV2",
    r"C:\Program Files (x86)\Amazon\AWSCLIV2",
];

const WINDOWS_ENV_ALLOW_LIST: &[&str] = &[
    "HOME",
    "USER",
    "USERNAME",
    "USERPROFILE",
    "SystemRoot",
    "ComSpec",
    "TEMP",
    "TMP",
];

static CURRENT: LazyLock<Platform> = LazyLock::new(|| {
    let family = if cfg!(target_os = "macos") {
        OsFamily::MacOs
    } else if cfg!(windows) {
        OsFamily::Windows
    } else {
        OsFamily::Other
    };
    Platform::for_family(family)
});

impl Platform {
    /// The platform this process runs on.
    pub fn current() -> &'static Platform {
        &CURRENT
    }

    pub fn for_family(family: OsFamily) -> Self {
        match family {
            OsFamily::Windows => Self {
                family,
                path_separator: '\\',
                path_list_separator: ';',
                case_insensitive_paths: true,
                locate_program: r"C:\Windows\System32\where.exe",
                aws_executable: "aws",
                search_dirs: WINDOWS_SEARCH_DIRS,
                trusted_prefixes: WINDOWS_TRUSTED_PREFIXES,
                env_allow_list: WINDOWS_ENV_ALLOW_LIST,
            },
            OsFamily::MacOs | OsFamily::Other => Self {
                family,
                path_separator: '/',
                path_list_separator: ':',
                case_insensitive_paths: false,
                locate_program: "which",
                aws_executable: "aws",
                search_dirs: UNIX_SEARCH_DIRS,
                trusted_prefixes: UNIX_TRUSTED_PREFIXES,
                env_allow_list: UNIX_ENV_ALLOW_LIST,
            },
        }
    }

    /// The `PATH` value handed to every child process.
    pub fn sanitized_search_path(&self) -> String {
        let sep = self.path_list_separator.to_string();
        self.search_dirs.join(&sep)
    }

    /// Puts a path in the form used for textual comparison on this platform.
    pub fn normalize_path_text(&self, path: &str) -> String {
        let mut text = path.to_string();
        if self.family == OsFamily::Windows {
            // `canonicalize` yields verbatim paths on Windows
            if let Some(stripped) = text.strip_prefix(r"\\?\UNC\") {
                text = format!(r"\\{stripped}");
            } else if let Some(stripped) = text.strip_prefix(r"\\?\") {
                text = stripped.to_string();
            }
            text = text.replace('/', "\\");
        }
        if self.case_insensitive_paths {
            text = text.to_lowercase();
        }
        text
    }
}
