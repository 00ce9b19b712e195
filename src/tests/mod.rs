pub mod test_optimizer;
pub mod test_replay_buffer;
