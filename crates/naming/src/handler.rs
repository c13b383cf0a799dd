use eyre::EyreHandler;
use std::{error::Error, fmt};

/// User-centric `eyre` report handler: prints the error chain without repeated messages.
#[derive(Default)]
pub struct Handler {
    debug_handler: Option<Box<dyn EyreHandler>>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the debug handler with a custom one.
    pub fn debug_handler(mut self, debug_handler: Option<Box<dyn EyreHandler>>) -> Self {
        self.debug_handler = debug_handler;
        self
    }
}

impl EyreHandler for Handler {
    fn display(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dedup_chain(error).join("; "))
    }

    fn debug(&self, error: &(dyn Error + 'static), f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(debug_handler) = &self.debug_handler {
            return debug_handler.debug(error, f);
        }
        if f.alternate() {
            return fmt::Debug::fmt(error, f);
        }

        let errors = dedup_chain(error);
        let Some((error, sources)) = errors.split_first() else { return Ok(()) };
        write!(f, "{error}")?;
        if !sources.is_empty() {
            write!(f, "\n\nContext:")?;
            for source in sources {
                write!(f, "\n- {source}")?;
            }
        }
        Ok(())
    }

    fn track_caller(&mut self, location: &'static std::panic::Location<'static>) {
        if let Some(debug_handler) = &mut self.debug_handler {
            debug_handler.track_caller(location);
        }
    }
}

/// Installs the `eyre` and panic hooks.
///
/// The user-centric handler is used unless `ENSCRIBE_DEBUG` is set, in which case
/// `color-eyre`'s report with span traces and backtraces is shown.
pub fn install() {
    let (panic_hook, debug_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("This is a bug. Please report it along with the command you ran.")
        .into_hooks();
    panic_hook.install();
    let debug_hook = debug_hook.into_eyre_hook();
    let debug = std::env::var_os("ENSCRIBE_DEBUG").is_some();
    if let Err(e) = eyre::set_hook(Box::new(move |e| {
        Box::new(Handler::new().debug_handler(debug.then(|| debug_hook(e))))
    })) {
        debug!("failed to install eyre error hook: {e}");
    }
}

/// Collects the messages of an error chain, skipping messages already contained in the
/// previous one.
fn dedup_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();
    let mut next = Some(error);
    while let Some(err) = next {
        let message = err.to_string();
        if !messages.last().is_some_and(|last| last.contains(&message)) && !message.is_empty() {
            messages.push(message);
        }
        next = err.source();
    }
    messages
}
