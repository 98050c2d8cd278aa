#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

use std::sync::{LazyLock, Mutex, PoisonError};
use std::time::Instant;

use lenient_core::{CoercionFault, FaultCallback, FaultSite, TokenKind};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = START_TIME.elapsed();
        write!(w, "{:4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    let _ = *START_TIME;

    let filter = std::env::var("LENIENT_LOG")
        .ok()
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::DEBUG));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_timer(Uptime)
                .with_target(false)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Sets up a tracing subscriber for tests.
///
/// Safe to call from every test: the subscriber is installed once per
/// process. The filter is read from `LENIENT_LOG` (for example
/// `LENIENT_LOG=lenient_json=trace`) and defaults to `debug`.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}

/// One recorded fault, reduced to the parts tests compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultEvent {
    /// Where the fault happened inside its owner.
    pub site: FaultSite,
    /// Rendered owner shape, such as `Order` or `Vec<i32>`.
    pub owner: String,
    /// The field holding the faulty value, if any.
    pub field: Option<&'static str>,
    /// Rendered expected shape.
    pub expected: String,
    /// The token found instead.
    pub token: TokenKind,
    /// Reader path of the faulty value.
    pub path: String,
}

impl From<&CoercionFault> for FaultEvent {
    fn from(fault: &CoercionFault) -> Self {
        Self {
            site: fault.site.clone(),
            owner: fault.owner.to_string(),
            field: fault.field,
            expected: fault.expected.to_string(),
            token: fault.token,
            path: fault.path.clone(),
        }
    }
}

/// A [`FaultCallback`] recording every fault it sees.
///
/// Share it through an `Arc` so the test keeps a handle after handing it to
/// a configuration.
#[derive(Debug, Default)]
pub struct FaultLog {
    events: Mutex<Vec<FaultEvent>>,
}

impl FaultLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fault recorded so far, in order.
    pub fn events(&self) -> Vec<FaultEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of faults recorded so far.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no fault was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, fault: &CoercionFault) {
        tracing::debug!(%fault, "recorded fault");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault.into());
    }
}

impl FaultCallback for FaultLog {
    fn on_field_fault(&self, fault: &CoercionFault) {
        self.record(fault);
    }

    fn on_list_item_fault(&self, fault: &CoercionFault) {
        self.record(fault);
    }

    fn on_map_entry_fault(&self, fault: &CoercionFault) {
        self.record(fault);
    }
}

/// An error type that panics when it's built (such as when you use `?`
/// to coerce to it)
#[derive(Debug)]
pub struct IPanic;

impl<E> From<E> for IPanic
where
    E: core::error::Error + Send + Sync,
{
    #[track_caller]
    fn from(value: E) -> Self {
        panic!("from: {}: {value}", core::panic::Location::caller())
    }
}
