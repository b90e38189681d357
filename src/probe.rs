use std::collections::BTreeSet;

use crate::execution::{Executor, Invocation};
use crate::ui::prelude::*;

/// Packages present before the manifest loop starts.
///
/// Captured once; entries installed during the run are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet {
    pub native: BTreeSet<String>,
    pub foreign: BTreeSet<String>,
}

impl InstalledSet {
    pub fn has_native(&self, name: &str) -> bool {
        self.native.contains(name)
    }

    pub fn has_foreign(&self, name: &str) -> bool {
        self.foreign.contains(name)
    }
}

fn query_names(executor: &dyn Executor, pacman: &str, flag: &str) -> BTreeSet<String> {
    let invocation = Invocation::new(pacman).arg(flag);
    match executor.capture(&invocation) {
        Ok(stdout) => stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(e) => {
            emit(
                Level::Warn,
                "probe.query.failed",
                &format!(
                    "{} Could not list installed packages ({}); assuming none",
                    char::from(NerdFont::Warning),
                    e
                ),
                None,
            );
            BTreeSet::new()
        }
    }
}

/// Snapshot native (`-Qqn`) and foreign (`-Qqm`) packages.
pub fn snapshot(executor: &dyn Executor, pacman: &str) -> InstalledSet {
    let set = InstalledSet {
        native: query_names(executor, pacman, "-Qqn"),
        foreign: query_names(executor, pacman, "-Qqm"),
    };
    emit(
        Level::Debug,
        "probe.snapshot",
        &format!(
            "{} native and {} foreign packages installed",
            set.native.len(),
            set.foreign.len()
        ),
        None,
    );
    set
}

/// Live check against the package database.
pub fn is_installed(executor: &dyn Executor, pacman: &str, name: &str) -> bool {
    match executor.capture(&Invocation::new(pacman).args(["-Qq", name])) {
        Ok(_) => true,
        // No exit code: the query never ran
        Err(e) if e.code().is_none() => {
            emit(
                Level::Warn,
                "probe.query.failed",
                &format!("{} Could not query {}: {}", char::from(NerdFont::Warning), name, e),
                None,
            );
            false
        }
        Err(_) => false,
    }
}
