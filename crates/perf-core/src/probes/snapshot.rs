//! One-shot environment snapshots: network quality and JS heap usage

use super::{Probe, ProbeContext};
use crate::error::Result;
use crate::event::{Category, Details, Event};
use crate::host::{ConnectionInfo, Disposer, Host, MemoryInfo};
use tracing::trace;

/// Names the connection-information extension is exposed under, in lookup order
pub const CONNECTION_ALIASES: [&str; 3] = ["connection", "mozConnection", "webkitConnection"];

#[derive(Debug, Clone, Copy)]
pub struct SnapshotProbe {
    pub include_network_info: bool,
    pub include_memory_snapshot: bool,
}

impl Default for SnapshotProbe {
    fn default() -> Self {
        Self {
            include_network_info: true,
            include_memory_snapshot: false,
        }
    }
}

/// First connection info found under any known alias
pub fn resolve_connection(host: &dyn Host) -> Option<ConnectionInfo> {
    CONNECTION_ALIASES
        .iter()
        .find_map(|alias| host.connection_info(alias))
}

impl SnapshotProbe {
    pub fn network_event(host: &dyn Host, info: ConnectionInfo) -> Event {
        Event::new(Category::Snapshot, "network-info")
            .with_url(host.page_url())
            .with_timestamp(host.now_ms())
            .with_details(
                Details::new()
                    .text("effectiveType", info.effective_type.as_deref())
                    .number("downlink", info.downlink)
                    .number("rtt", info.rtt)
                    .flag("saveData", info.save_data),
            )
    }

    pub fn memory_event(host: &dyn Host, info: MemoryInfo) -> Event {
        Event::new(Category::Snapshot, "js-heap")
            .with_url(host.page_url())
            .with_timestamp(host.now_ms())
            .with_details(
                Details::new()
                    .number("jsHeapSizeLimit", info.js_heap_size_limit)
                    .number("totalJSHeapSize", info.total_js_heap_size)
                    .number("usedJSHeapSize", info.used_js_heap_size),
            )
    }
}

impl Probe for SnapshotProbe {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn start(&self, ctx: &ProbeContext) -> Result<Option<Disposer>> {
        let host = ctx.host.as_ref();

        if self.include_network_info {
            match resolve_connection(host) {
                Some(info) => ctx.emit(Self::network_event(host, info)),
                None => trace!("No connection information exposed"),
            }
        }

        if self.include_memory_snapshot {
            match host.memory_info() {
                Some(info) => ctx.emit(Self::memory_event(host, info)),
                None => trace!("No memory information exposed"),
            }
        }

        Ok(None)
    }
}
