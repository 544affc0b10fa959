use std::cell::RefCell;
use std::collections::VecDeque;
use stylemirror_core::ai::AiResult;
use stylemirror_core::{AiError, ChatModel, ChatRequest};

/// Chat model that replays queued replies and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: RefCell<VecDeque<AiResult<String>>>,
    requests: RefCell<Vec<ChatRequest>>,
}

#[allow(dead_code)]
impl ScriptedModel {
    pub fn with_replies(replies: &[&str]) -> Self {
        let model = Self::default();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.borrow_mut().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self, error: AiError) {
        self.replies.borrow_mut().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    /// User-role prompt of the n-th request.
    pub fn user_prompt(&self, index: usize) -> String {
        self.requests.borrow()[index].messages[1].content.clone()
    }

    pub fn system_prompt(&self, index: usize) -> String {
        self.requests.borrow()[index].messages[0].content.clone()
    }

    pub fn request(&self, index: usize) -> ChatRequest {
        self.requests.borrow()[index].clone()
    }
}

impl ChatModel for ScriptedModel {
    fn complete(&self, request: &ChatRequest) -> AiResult<String> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyResponse))
    }
}
