use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("friday.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("friday.client.request_errors");
pub(crate) static CLIENT_CREDENTIAL_MISSING: Counter =
    Counter::new("friday.client.credential_missing");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("friday.client.request_duration_seconds");

pub(crate) static STORE_LOADS: Counter = Counter::new("friday.store.loads");
pub(crate) static STORE_LOAD_MISSING: Counter = Counter::new("friday.store.load_missing");
pub(crate) static STORE_LOAD_MALFORMED: Counter = Counter::new("friday.store.load_malformed");
pub(crate) static STORE_SAVES: Counter = Counter::new("friday.store.saves");
pub(crate) static STORE_INDEX_APPENDS: Counter = Counter::new("friday.store.index_appends");

pub(crate) static CHAT_TEXT_TURNS: Counter = Counter::new("friday.chat.text_turns");
pub(crate) static CHAT_IMAGE_TURNS: Counter = Counter::new("friday.chat.image_turns");
pub(crate) static CHAT_FAILED_TURNS: Counter = Counter::new("friday.chat.failed_turns");

pub(crate) static RENDER_RESPONSES: Counter = Counter::new("friday.render.responses");
pub(crate) static BROWSER_OPENS: Counter = Counter::new("friday.browser.opens");
pub(crate) static BROWSER_OPEN_ERRORS: Counter = Counter::new("friday.browser.open_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_CREDENTIAL_MISSING);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STORE_LOADS);
    collector.register_counter(&STORE_LOAD_MISSING);
    collector.register_counter(&STORE_LOAD_MALFORMED);
    collector.register_counter(&STORE_SAVES);
    collector.register_counter(&STORE_INDEX_APPENDS);

    collector.register_counter(&CHAT_TEXT_TURNS);
    collector.register_counter(&CHAT_IMAGE_TURNS);
    collector.register_counter(&CHAT_FAILED_TURNS);

    collector.register_counter(&RENDER_RESPONSES);
    collector.register_counter(&BROWSER_OPENS);
    collector.register_counter(&BROWSER_OPEN_ERRORS);
}
