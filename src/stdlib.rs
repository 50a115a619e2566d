//! Standard-library name lookup
//!
//! Classification needs to know which module names ship with the
//! interpreter. The lookup is a capability interface so the classifier does
//! not care whether an authoritative name set or a per-module origin probe
//! backs it, and so tests can inject a fake set for version-specific
//! scenarios.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex};

/// Decides whether a module name belongs to the standard library.
pub trait StdlibOracle: Send + Sync {
    fn is_stdlib(&self, module: &str) -> bool;
}

impl<T: StdlibOracle + ?Sized> StdlibOracle for &T {
    fn is_stdlib(&self, module: &str) -> bool {
        (**self).is_stdlib(module)
    }
}

/// Top-level standard-library module names: the union of
/// `sys.stdlib_module_names` across supported CPython versions, so scripts
/// written for older interpreters still classify correctly.
const BUNDLED_NAMES: &[&str] = &[
    "__future__",
    "__main__",
    "_thread",
    "abc",
    "aifc",
    "argparse",
    "array",
    "ast",
    "asynchat",
    "asyncio",
    "asyncore",
    "atexit",
    "audioop",
    "base64",
    "bdb",
    "binascii",
    "bisect",
    "builtins",
    "bz2",
    "calendar",
    "cgi",
    "cgitb",
    "chunk",
    "cmath",
    "cmd",
    "code",
    "codecs",
    "codeop",
    "collections",
    "colorsys",
    "compileall",
    "concurrent",
    "configparser",
    "contextlib",
    "contextvars",
    "copy",
    "copyreg",
    "cProfile",
    "crypt",
    "csv",
    "ctypes",
    "curses",
    "dataclasses",
    "datetime",
    "dbm",
    "decimal",
    "difflib",
    "dis",
    "distutils",
    "doctest",
    "email",
    "encodings",
    "ensurepip",
    "enum",
    "errno",
    "faulthandler",
    "fcntl",
    "filecmp",
    "fileinput",
    "fnmatch",
    "fractions",
    "ftplib",
    "functools",
    "gc",
    "getopt",
    "getpass",
    "gettext",
    "glob",
    "graphlib",
    "grp",
    "gzip",
    "hashlib",
    "heapq",
    "hmac",
    "html",
    "http",
    "idlelib",
    "imaplib",
    "imghdr",
    "imp",
    "importlib",
    "inspect",
    "io",
    "ipaddress",
    "itertools",
    "json",
    "keyword",
    "lib2to3",
    "linecache",
    "locale",
    "logging",
    "lzma",
    "mailbox",
    "mailcap",
    "marshal",
    "math",
    "mimetypes",
    "mmap",
    "modulefinder",
    "msvcrt",
    "multiprocessing",
    "netrc",
    "nntplib",
    "ntpath",
    "numbers",
    "operator",
    "optparse",
    "os",
    "pathlib",
    "pdb",
    "pickle",
    "pickletools",
    "pipes",
    "pkgutil",
    "platform",
    "plistlib",
    "poplib",
    "posix",
    "posixpath",
    "pprint",
    "profile",
    "pstats",
    "pty",
    "pwd",
    "pyclbr",
    "pydoc",
    "queue",
    "quopri",
    "random",
    "re",
    "readline",
    "reprlib",
    "resource",
    "rlcompleter",
    "runpy",
    "sched",
    "secrets",
    "select",
    "selectors",
    "shelve",
    "shlex",
    "shutil",
    "signal",
    "site",
    "smtpd",
    "smtplib",
    "sndhdr",
    "socket",
    "socketserver",
    "sqlite3",
    "ssl",
    "stat",
    "statistics",
    "string",
    "stringprep",
    "struct",
    "subprocess",
    "sunau",
    "symtable",
    "sys",
    "sysconfig",
    "syslog",
    "tabnanny",
    "tarfile",
    "telnetlib",
    "tempfile",
    "termios",
    "textwrap",
    "this",
    "threading",
    "time",
    "timeit",
    "tkinter",
    "token",
    "tokenize",
    "tomllib",
    "trace",
    "traceback",
    "tracemalloc",
    "tty",
    "turtle",
    "turtledemo",
    "types",
    "typing",
    "unicodedata",
    "unittest",
    "urllib",
    "uu",
    "uuid",
    "venv",
    "warnings",
    "wave",
    "weakref",
    "webbrowser",
    "winreg",
    "winsound",
    "wsgiref",
    "xdrlib",
    "xml",
    "xmlrpc",
    "zipapp",
    "zipfile",
    "zipimport",
    "zlib",
    "zoneinfo",
];

static BUNDLED: LazyLock<StdlibNames> =
    LazyLock::new(|| StdlibNames::from_names(BUNDLED_NAMES.iter().map(|name| name.to_string())));

/// Authoritative name-set oracle.
///
/// Immutable after construction, so a batch driver can share one instance
/// across parallel workers.
#[derive(Debug, Clone)]
pub struct StdlibNames {
    names: HashSet<String>,
}

impl StdlibNames {
    /// The compiled-in name table, built once per process.
    pub fn bundled() -> &'static StdlibNames {
        &BUNDLED
    }

    /// Build from an explicit set of names (interpreter queries, tests).
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Query `python` for its `sys.stdlib_module_names`.
    ///
    /// Errors on interpreters older than 3.10, where the attribute does not
    /// exist; callers degrade to an [`OriginProbe`] in that case.
    pub fn for_interpreter(python: &Path) -> io::Result<Self> {
        let output = Command::new(python)
            .args(["-c", "import sys; print('\\n'.join(sys.stdlib_module_names))"])
            .output()?;
        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} has no sys.stdlib_module_names",
                python.display()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::from_names(
            stdout
                .lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
        ))
    }
}

impl StdlibOracle for StdlibNames {
    fn is_stdlib(&self, module: &str) -> bool {
        self.names.contains(module)
    }
}

/// Script handed to the interpreter by [`OriginProbe`]: locate the module
/// and report whether its origin is `built-in`.
const ORIGIN_PROBE: &str = "\
import importlib.util, sys
try:
    spec = importlib.util.find_spec(sys.argv[1])
except (ImportError, ValueError):
    spec = None
print('1' if spec is not None and spec.origin == 'built-in' else '0')
";

/// Best-effort fallback for interpreters without
/// `sys.stdlib_module_names`.
///
/// Asks the interpreter where the module comes from and trusts only a
/// `built-in` origin. Inability to determine the origin is not an error;
/// the name falls through to the next classification step. Answers are
/// cached per name.
pub struct OriginProbe {
    python: PathBuf,
    cache: Mutex<HashMap<String, bool>>,
}

impl OriginProbe {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn probe(&self, module: &str) -> bool {
        // Roots are plain identifiers; reject anything else before
        // spawning an interpreter for it.
        if module.is_empty()
            || !module
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return false;
        }
        let output = Command::new(&self.python)
            .args(["-c", ORIGIN_PROBE, module])
            .output();
        match output {
            Ok(out) if out.status.success() => out.stdout.starts_with(b"1"),
            _ => false,
        }
    }
}

impl StdlibOracle for OriginProbe {
    fn is_stdlib(&self, module: &str) -> bool {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(&hit) = cache.get(module) {
                return hit;
            }
            let hit = self.probe(module);
            cache.insert(module.to_string(), hit);
            return hit;
        }
        self.probe(module)
    }
}

/// Pick the oracle for an optionally specified interpreter.
///
/// With no interpreter the bundled table answers. With one, prefer that
/// interpreter's own authoritative set and degrade to the origin probe
/// when the attribute is missing.
pub fn select_oracle(interpreter: Option<&Path>) -> Box<dyn StdlibOracle> {
    match interpreter {
        Some(python) => match StdlibNames::for_interpreter(python) {
            Ok(names) => Box::new(names),
            Err(_) => Box::new(OriginProbe::new(python)),
        },
        None => Box::new(StdlibNames::bundled()),
    }
}
