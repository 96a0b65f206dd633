//! Command buffer allocation
//!
//! A pool owns a set of command buffers and hands out stable ids for them.
//! Buffers are never freed individually; dropping the pool (or resetting
//! it) reclaims everything, which matches the allocate-once reuse pattern
//! of a frame loop.

use slotmap::SlotMap;

use crate::core::command_buffer::CommandBuffer;

slotmap::new_key_type! {
    /// Generational id of a command buffer inside its pool
    pub struct CommandBufferId;
}

/// Owner and allocator of [`CommandBuffer`]s
#[derive(Debug, Default)]
pub struct CommandPool {
    buffers: SlotMap<CommandBufferId, CommandBuffer>,
}

impl CommandPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate one command buffer in the `Initial` state
    pub fn allocate(&mut self) -> CommandBufferId {
        self.buffers.insert(CommandBuffer::new())
    }

    /// Allocate several command buffers at once
    pub fn allocate_many(&mut self, count: usize) -> Vec<CommandBufferId> {
        (0..count).map(|_| self.allocate()).collect()
    }

    /// Borrow a buffer for submission
    pub fn get(&self, id: CommandBufferId) -> Option<&CommandBuffer> {
        self.buffers.get(id)
    }

    /// Borrow a buffer for recording
    pub fn get_mut(&mut self, id: CommandBufferId) -> Option<&mut CommandBuffer> {
        self.buffers.get_mut(id)
    }

    /// Free one buffer; its id becomes stale
    pub fn free(&mut self, id: CommandBufferId) {
        self.buffers.remove(id);
    }

    /// Reset every buffer in the pool back to `Initial`
    pub fn reset_all(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.reset();
        }
    }

    /// Number of live buffers
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the pool holds no buffers
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command_buffer::CommandBufferState;
    use crate::core::flags::CommandBufferUsageFlags;

    #[test]
    fn allocate_and_record() {
        let mut pool = CommandPool::new();
        let id = pool.allocate();
        let cmd = pool.get_mut(id).unwrap();
        cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
        cmd.cmd_draw(3, 1, 0, 0).unwrap();
        cmd.end().unwrap();
        assert_eq!(pool.get(id).unwrap().commands().len(), 1);
    }

    #[test]
    fn freed_ids_are_stale() {
        let mut pool = CommandPool::new();
        let id = pool.allocate();
        pool.free(id);
        assert!(pool.get(id).is_none());

        // The slot may be reused, but the old id stays dead.
        let id2 = pool.allocate();
        assert!(pool.get(id).is_none());
        assert!(pool.get(id2).is_some());
    }

    #[test]
    fn reset_all_returns_buffers_to_initial() {
        let mut pool = CommandPool::new();
        let ids = pool.allocate_many(3);
        for &id in &ids {
            let cmd = pool.get_mut(id).unwrap();
            cmd.begin(CommandBufferUsageFlags::empty()).unwrap();
            cmd.cmd_draw(3, 1, 0, 0).unwrap();
            cmd.end().unwrap();
        }
        pool.reset_all();
        for &id in &ids {
            let cmd = pool.get(id).unwrap();
            assert_eq!(cmd.state(), CommandBufferState::Initial);
            assert!(cmd.commands().is_empty());
        }
    }
}
