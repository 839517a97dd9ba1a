use crate::pipeline::Pipeline;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) pipeline: Pipeline,
}
