use core_types::{ContainerId, RenderVersion, RequestId};
use std::sync::mpsc::{self, Receiver, Sender};
use vdom::Element;

#[derive(Debug)]
pub enum RenderCommand {
    /// Allocate a display container; answered with `ContainerReady`.
    CreateContainer {
        container_id: ContainerId,
    },
    /// Schedule `element` into the container. Work happens in later slices.
    Render {
        container_id: ContainerId,
        request_id: RequestId,
        element: Element,
    },
    /// Report what the container currently displays.
    Snapshot {
        container_id: ContainerId,
        request_id: RequestId,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum RenderEvent {
    ContainerReady {
        container_id: ContainerId,
    },
    Committed {
        container_id: ContainerId,
        request_id: RequestId,
        version: RenderVersion,
        work_units: usize,
        placements: usize,
        updates: usize,
        deletions: usize,
    },
    RenderFailed {
        container_id: ContainerId,
        request_id: RequestId,
        error: String,
    },
    Snapshot {
        container_id: ContainerId,
        request_id: RequestId,
        version: RenderVersion,
        lines: Vec<String>,
    },
}

pub struct Bus {
    pub cmd_tx: Sender<RenderCommand>,
    pub cmd_rx: Receiver<RenderCommand>,
    pub evt_tx: Sender<RenderEvent>, // shareable for runtimes
    pub evt_rx: Receiver<RenderEvent>,
}

impl Bus {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        Self {
            cmd_tx,
            cmd_rx,
            evt_tx,
            evt_rx,
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
