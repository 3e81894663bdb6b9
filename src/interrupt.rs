use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Hook = Box<dyn FnOnce() + Send>;

/// Operator stop request, shared between the signal handler and the relay loop.
///
/// Hooks registered with [`Interrupt::on_trigger`] run once, on the thread that
/// calls [`Interrupt::trigger`]. They are how a blocked read gets released.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    triggered: AtomicBool,
    hooks: Mutex<Vec<Hook>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the process-wide Ctrl-C handler. Can only succeed once per process.
    pub fn install_ctrlc(&self) -> anyhow::Result<()> {
        let interrupt = self.clone();
        ctrlc::set_handler(move || interrupt.trigger())?;
        Ok(())
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("interrupt received");
        for hook in self.take_hooks() {
            hook();
        }
    }

    /// Registers `hook` to run on trigger. Runs it immediately if already triggered.
    pub fn on_trigger(&self, hook: impl FnOnce() + Send + 'static) {
        {
            let mut hooks = match self.inner.hooks.lock() {
                Ok(hooks) => hooks,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !self.is_triggered() {
                hooks.push(Box::new(hook));
                return;
            }
        }
        hook();
    }

    fn take_hooks(&self) -> Vec<Hook> {
        let mut hooks = match self.inner.hooks.lock() {
            Ok(hooks) => hooks,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *hooks)
    }
}
