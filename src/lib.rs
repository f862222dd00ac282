//! Campus assistant web front end - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

use crate::config::Settings;
use crate::core::services::QueuedChatService;
use crate::core::sessions::InMemorySessionStore;
use crate::core::tasks::InMemoryTaskRegistry;
use crate::core::worker::ChatQueue;
use crate::infrastructure::gemini::GeminiClient;
use crate::infrastructure::pdf::PdfTextExtractor;
use crate::infrastructure::templates::PageTemplates;
use di::{Injectable, Ref, ServiceCollection, singleton_as_self};

/// Registers every service the web front end needs.
///
/// `queue` is the sending half of the chat job queue; its receiver belongs to the dispatcher
/// started by the caller.
pub fn services(settings: Settings, queue: ChatQueue) -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(singleton_as_self::<Settings>().from(move |_| Ref::new(settings.clone())))
        .add(singleton_as_self::<ChatQueue>().from(move |_| Ref::new(queue.clone())))
        .add(InMemoryTaskRegistry::singleton())
        .add(InMemorySessionStore::singleton())
        .add(GeminiClient::singleton())
        .add(PdfTextExtractor::singleton())
        .add(PageTemplates::singleton())
        .add(QueuedChatService::scoped());
    services
}
