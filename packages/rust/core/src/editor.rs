//! On-demand loading state for the editor view.
//!
//! The editor's content is loaded when a post is opened, not up front.
//! [`EditorResource`] tracks that load per post id so a slow response for a
//! post the user already left is dropped instead of overwriting the current
//! one.

/// Load state of the editor content, keyed by post id.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorResource<T> {
    #[default]
    Idle,
    Loading {
        post_id: u64,
    },
    Ready {
        post_id: u64,
        value: T,
    },
    Failed {
        post_id: u64,
        message: String,
    },
}

impl<T> EditorResource<T> {
    /// Ask for `post_id`. Returns `true` when a load must be started, `false`
    /// when that post is already loading or loaded.
    pub fn request(&mut self, post_id: u64) -> bool {
        match self {
            Self::Loading { post_id: id } | Self::Ready { post_id: id, .. } if *id == post_id => {
                false
            }
            _ => {
                *self = Self::Loading { post_id };
                true
            }
        }
    }

    /// Force a new load of `post_id`, even if it is already loaded.
    pub fn reload(&mut self, post_id: u64) {
        *self = Self::Loading { post_id };
    }

    /// Deliver a load result. Results for any post other than the one being
    /// loaded are ignored; returns whether the result was accepted.
    pub fn resolve(&mut self, post_id: u64, result: std::result::Result<T, String>) -> bool {
        match self {
            Self::Loading { post_id: id } if *id == post_id => {
                *self = match result {
                    Ok(value) => Self::Ready { post_id, value },
                    Err(message) => Self::Failed { post_id, message },
                };
                true
            }
            _ => {
                tracing::debug!(post_id, "dropping stale editor load result");
                false
            }
        }
    }

    /// Forget any loaded content.
    pub fn clear(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// The post this resource refers to, if any.
    pub fn post_id(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Loading { post_id }
            | Self::Ready { post_id, .. }
            | Self::Failed { post_id, .. } => Some(*post_id),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_starts_loading_once() {
        let mut res: EditorResource<String> = EditorResource::default();
        assert!(res.request(1));
        assert!(!res.request(1));
        assert!(res.is_loading());
        assert_eq!(res.post_id(), Some(1));
    }

    #[test]
    fn resolve_moves_to_ready_or_failed() {
        let mut res = EditorResource::default();
        res.request(1);
        assert!(res.resolve(1, Ok("body".to_string())));
        assert_eq!(res.value().map(String::as_str), Some("body"));
        assert!(!res.request(1));

        res.request(2);
        assert!(res.resolve(2, Err("HTTP 500".into())));
        assert_eq!(
            res,
            EditorResource::Failed {
                post_id: 2,
                message: "HTTP 500".into()
            }
        );
        // A failed post can be requested again.
        assert!(res.request(2));
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut res = EditorResource::default();
        res.request(1);
        res.request(2);
        assert!(!res.resolve(1, Ok("old".to_string())));
        assert_eq!(res, EditorResource::Loading { post_id: 2 });

        res.clear();
        assert!(!res.resolve(2, Ok("late".to_string())));
        assert_eq!(res, EditorResource::Idle);
    }

    #[test]
    fn reload_forces_loading() {
        let mut res = EditorResource::default();
        res.request(4);
        res.resolve(4, Ok(1u32));
        res.reload(4);
        assert!(res.is_loading());
    }
}
