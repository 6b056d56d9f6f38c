mod acceptance;
mod cancellation;
mod common;
mod completion;
mod information;
mod listings;
mod notifications;
