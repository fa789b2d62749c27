//! View routing and navigation between the scanner and the editor.

use amzwp_shared::{AppStep, BlogPost};
use amzwp_storage::KvStore;

use crate::store::{AppStore, StateChange};

/// The top-level view to show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Landing,
    Scanner,
    Editor(&'a BlogPost),
}

/// Pick the view for the given state.
///
/// `EDITOR` without a selected post cannot be reached through the navigation
/// helpers below, but is tolerated by showing the scanner.
pub fn route(has_entered: bool, step: AppStep, selected: Option<&BlogPost>) -> View<'_> {
    if !has_entered {
        return View::Landing;
    }
    match (step, selected) {
        (AppStep::Sitemap, _) => View::Scanner,
        (AppStep::Editor, Some(post)) => View::Editor(post),
        (AppStep::Editor, None) => {
            tracing::debug!("editor step without a selected post, showing scanner");
            View::Scanner
        }
    }
}

/// The view for `store`'s current state.
pub fn current_view<S: KvStore>(store: &AppStore<S>) -> View<'_> {
    route(store.has_entered(), store.current_step(), store.selected_post())
}

/// Select `post` and switch to the editor.
pub fn open_post<S: KvStore>(store: &mut AppStore<S>, post: BlogPost) -> Vec<StateChange> {
    let mut changes = store.set_selected_post(Some(post));
    changes.extend(store.set_step(AppStep::Editor));
    changes
}

/// Clear the selection and return to the scanner.
pub fn back_to_sitemap<S: KvStore>(store: &mut AppStore<S>) -> Vec<StateChange> {
    let mut changes = store.set_selected_post(None);
    changes.extend(store.set_step(AppStep::Sitemap));
    changes
}

/// Replace the selected post while staying in the editor.
pub fn switch_post<S: KvStore>(store: &mut AppStore<S>, post: BlogPost) -> Vec<StateChange> {
    store.set_selected_post(Some(post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amzwp_storage::MemoryStore;

    fn post(id: u64) -> BlogPost {
        BlogPost::new(id, format!("Post {id}"), format!("https://blog.example.com/p{id}/"))
    }

    #[test]
    fn landing_until_entered() {
        assert_eq!(route(false, AppStep::Sitemap, None), View::Landing);
        let p = post(1);
        assert_eq!(route(false, AppStep::Editor, Some(&p)), View::Landing);
    }

    #[test]
    fn entering_shows_scanner() {
        let mut store = AppStore::load(MemoryStore::new());
        assert_eq!(current_view(&store), View::Landing);
        store.enter();
        assert_eq!(current_view(&store), View::Scanner);
    }

    #[test]
    fn editor_without_post_falls_back() {
        let mut store = AppStore::load(MemoryStore::new());
        store.enter();
        store.set_step(AppStep::Editor);
        assert_eq!(current_view(&store), View::Scanner);
    }

    #[test]
    fn open_switch_and_back() {
        let mut store = AppStore::load(MemoryStore::new());
        store.enter();

        let changes = open_post(&mut store, post(1));
        assert_eq!(
            changes,
            vec![
                StateChange::SelectionChanged(Some(1)),
                StateChange::StepChanged(AppStep::Editor)
            ]
        );
        assert!(matches!(current_view(&store), View::Editor(p) if p.id == 1));

        switch_post(&mut store, post(2));
        assert!(matches!(current_view(&store), View::Editor(p) if p.id == 2));

        back_to_sitemap(&mut store);
        assert_eq!(current_view(&store), View::Scanner);
        assert!(store.selected_post().is_none());
    }
}
