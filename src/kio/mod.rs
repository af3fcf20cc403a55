//! Session orchestration
//!
//! A [`Kio`] session composes the control tree, the reload action and the
//! kernel log window into one configure → run → collect pipeline:
//!
//! 1. read the current thread count and reload the generator if it must change
//! 2. write global settings (`num_threads` only when it changes,
//!    `runtime_seconds` always)
//! 3. write the set keys of each thread's settings
//! 4. capture a log marker, write the run trigger, harvest the new lines
//!
//! The trigger write blocks until the generator has finished and printed its
//! results; harvesting relies on that. There is no timeout.

pub mod schema;

use crate::control::{ConfigStore, NodePath, Value};
use crate::dmesg::{LogSource, LogWindow};
use crate::error::KioError;
use crate::reload::{needs_reload, Reloader};
use crate::results::{parser, RunResult};
use schema::*;
use std::path::PathBuf;

/// One orchestrator session over a control tree and a log source
pub struct Kio<S, L, R> {
    store: S,
    window: LogWindow<L>,
    reloader: R,
    version: Option<String>,
}

impl<S, L, R> Kio<S, L, R>
where
    S: ConfigStore,
    L: LogSource,
    R: Reloader,
{
    /// Wrap the collaborators; nothing is read or written yet
    pub fn new(store: S, log: L, reloader: R) -> Self {
        Self {
            store,
            window: LogWindow::new(log),
            reloader,
            version: None,
        }
    }

    /// Version of the generator, known after [`Kio::init`]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Bring the generator to the requested global settings
    ///
    /// Reloads the generator when an initialized instance has a different
    /// thread count. A failed reload aborts before anything is written.
    pub fn init(&mut self, global: &GlobalSettings) -> Result<(), KioError> {
        let num_threads = NodePath::global(GlobalKey::NumThreads.as_str());
        let current = self.read_int(&num_threads)?;
        log::debug!("num_threads: current={:?} requested={}", current, global.num_threads);

        let reloaded = needs_reload(current, global.num_threads);
        if reloaded {
            log::info!(
                "Thread count changes from {} to {}, reloading generator",
                current.unwrap_or_default(),
                global.num_threads
            );
            self.reloader.reload()?;
        }

        if reloaded || current != Some(global.num_threads as i64) {
            self.store.write(&num_threads, &Value::from(global.num_threads))?;
        }

        self.store.write(
            &NodePath::global(GlobalKey::RuntimeSeconds.as_str()),
            &Value::from(global.runtime_seconds),
        )?;

        self.version = Some(self.store.read_version()?);
        Ok(())
    }

    /// Write the set keys of `settings` for thread `tid`
    pub fn set_thread_config(&self, tid: u32, settings: &ThreadSettings) -> Result<(), KioError> {
        for (key, value) in settings.iter() {
            self.store
                .write(&NodePath::thread(tid, key.as_str()), &Value::from(value))?;
        }
        Ok(())
    }

    /// Apply a plan to threads `0..num_threads`
    pub fn apply_thread_plan(&self, num_threads: u32, plan: &ThreadPlan) -> Result<(), KioError> {
        for &tid in plan.per_thread.keys().filter(|&&tid| tid >= num_threads) {
            log::warn!("Ignoring settings for thread {} (only {} threads)", tid, num_threads);
        }
        for tid in 0..num_threads {
            self.set_thread_config(tid, &plan.for_thread(tid))?;
        }
        Ok(())
    }

    /// Trigger exactly one run and parse its log output
    pub fn run(&self) -> Result<RunResult, KioError> {
        let marker = self.window.mark()?;

        log::info!("Triggering run");
        self.store
            .write(&NodePath::global(RUN_TRIGGER), &Value::Int(1))?;

        let lines = self.window.since(&marker)?;
        log::debug!("Captured {} log lines", lines.len());
        if lines.is_empty() {
            return Err(KioError::EmptyRun);
        }

        parser::parse(lines)
    }

    /// Configure the generator and perform one run
    ///
    /// Rewriting the same configuration is harmless; every call triggers a
    /// new physical run.
    pub fn configure_and_run(
        &mut self,
        global: &GlobalSettings,
        plan: &ThreadPlan,
    ) -> Result<RunResult, KioError> {
        self.init(global)?;
        self.apply_thread_plan(global.num_threads, plan)?;
        self.run()
    }

    /// Current global settings as held by the control tree
    pub fn get_global_config(&self) -> Result<GlobalSettings, KioError> {
        Ok(GlobalSettings {
            num_threads: self.read_required_u32(GlobalKey::NumThreads)?,
            runtime_seconds: self.read_required_u32(GlobalKey::RuntimeSeconds)?,
        })
    }

    /// Current settings of thread `tid`; keys without a node stay unset
    pub fn get_thread_config(&self, tid: u32) -> Result<ThreadSettings, KioError> {
        let mut settings = ThreadSettings::default();
        for key in ThreadKey::ALL {
            let path = NodePath::thread(tid, key.as_str());
            let value = match self.read_int(&path)? {
                Some(v) => Some(u64::try_from(v).map_err(|_| not_numeric(&path, v.to_string()))?),
                None => None,
            };
            settings.set(key, value);
        }
        Ok(settings)
    }

    /// Snapshot of global and per-thread settings
    pub fn get_config(&self) -> Result<KioConfig, KioError> {
        let global = self.get_global_config()?;
        let threads = (0..global.num_threads)
            .map(|tid| self.get_thread_config(tid))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KioConfig { global, threads })
    }

    fn read_int(&self, path: &NodePath) -> Result<Option<i64>, KioError> {
        match self.store.read(path)? {
            None => Ok(None),
            Some(Value::Int(v)) => Ok(Some(v)),
            Some(Value::Text(text)) => Err(not_numeric(path, text)),
        }
    }

    fn read_required_u32(&self, key: GlobalKey) -> Result<u32, KioError> {
        let path = NodePath::global(key.as_str());
        let value = self.read_int(&path)?.ok_or_else(|| KioError::MissingNode {
            path: PathBuf::from(path.to_string()),
        })?;
        u32::try_from(value).map_err(|_| not_numeric(&path, value.to_string()))
    }
}

fn not_numeric(path: &NodePath, text: String) -> KioError {
    KioError::NotNumeric {
        path: PathBuf::from(path.to_string()),
        text,
    }
}
