//! Integration tests for the router.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use waypoint::{
    AddressSource, Dispatcher, History, MemoryHistory, NavigateOptions, Navigator,
    NavigatorConfig, Rejection, Resolve, Router, RouterConfig, StateNode, Target, TickOutcome,
    Transition,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Application context: a fake backend plus a render log.
#[derive(Default)]
struct Blog {
    rendered: Mutex<Vec<String>>,
    fetches: Mutex<Vec<String>>,
}

impl Blog {
    fn fetch(&self, what: String) {
        self.fetches.lock().push(what);
    }
}

fn blog_states() -> Vec<StateNode<Blog>> {
    vec![
        StateNode::builder("home", "/").build().unwrap(),
        StateNode::builder("authors", "/authors/:author")
            .resolve(|args: Resolve<Blog>| async move {
                let author = args.path_params["author"].clone();
                args.context.fetch(format!("author:{}", author));
                Ok::<_, Rejection>(json!({ "author": author, "posts": 3 }))
            })
            .children([
                StateNode::builder("posts", "/posts")
                    .query(["page"])
                    .resolve(|args: Resolve<Blog>| async move {
                        let author = args.dependencies["authors"]["author"].clone();
                        let page = args.search_params["page"].clone();
                        args.context.fetch(format!("posts:{}:{}", author, page));
                        Ok::<_, Rejection>(json!({ "author": author, "page": page }))
                    })
                    .build()
                    .unwrap(),
                StateNode::builder("post", r"/posts/:slug([a-z0-9-]+)")
                    .resolve(|args: Resolve<Blog>| async move {
                        let slug = args.path_params["slug"].clone();
                        let posts = &args.dependencies["authors"]["posts"];
                        args.context.fetch(format!("post:{}", slug));
                        Ok::<_, Rejection>(json!({ "slug": slug, "of": posts }))
                    })
                    .build()
                    .unwrap(),
            ])
            .build()
            .unwrap(),
    ]
}

fn render_into(dispatcher: &Dispatcher<Blog>, name: &'static str) {
    dispatcher.register(name, move |_: Router<Blog>, t: Arc<Transition<Blog>>| async move {
        t.context.rendered.lock().push(format!("{} {:?}", name, t.path_params));
        Ok::<_, Rejection>(())
    });
}

// --- Router Workflow Tests ---

#[tokio::test]
async fn test_nested_resolution_uses_parent_payload() {
    init_tracing();
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    let transition = router
        .transition(&Target::new("authors.post").path("author", "ada").path("slug", "engines"))
        .await
        .unwrap();

    assert_eq!(transition.name, "authors.post");
    assert_eq!(transition.dependencies["post"], json!({ "slug": "engines", "of": 3 }));
    assert_eq!(
        *router.context().fetches.lock(),
        vec!["author:ada".to_string(), "post:engines".to_string()]
    );
}

#[tokio::test]
async fn test_sibling_switch_keeps_parent() {
    init_tracing();
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    router
        .transition_to_address("/authors/ada/posts?page=1")
        .await
        .unwrap();
    router
        .transition_to_address("/authors/ada/posts?page=2")
        .await
        .unwrap();
    let transition = router
        .transition_to_address("/authors/ada/posts/engines")
        .await
        .unwrap();

    assert_eq!(transition.name, "authors.post");
    assert_eq!(
        *router.context().fetches.lock(),
        vec![
            "author:ada".to_string(),
            "posts:\"ada\":1".to_string(),
            "posts:\"ada\":2".to_string(),
            "post:engines".to_string(),
        ]
    );

    let active = router.active();
    assert_eq!(active.chain.len(), 2);
    assert!(active.dependencies.contains_key("authors"));
    assert!(active.dependencies.contains_key("post"));
    assert!(!active.dependencies.contains_key("posts"));
}

#[tokio::test]
async fn test_child_with_same_params_carries_over_under_new_parent() {
    init_tracing();
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    router.transition_to_address("/authors/ada/posts/engines").await.unwrap();
    let transition = router
        .transition_to_address("/authors/grace/posts/engines")
        .await
        .unwrap();

    // Same node at the same position with equal parameters is reused.
    assert_eq!(
        *router.context().fetches.lock(),
        vec![
            "author:ada".to_string(),
            "post:engines".to_string(),
            "author:grace".to_string(),
        ]
    );
    assert_eq!(transition.dependencies["authors"]["author"], "grace");
}

#[test]
fn test_address_and_name_agree() {
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    let target = Target::new("authors.posts").path("author", "ada").query("page", "4");
    let url = router.state_to_url(&target).unwrap();
    assert_eq!(url, "/authors/ada/posts?page=4");
    assert_eq!(router.address_to_state(&url).unwrap(), target);

    // Unknown query parameters are ignored when matching.
    let matched = router
        .address_to_state("/authors/ada/posts?page=4&utm=mail")
        .unwrap();
    assert_eq!(matched, target);
}

#[tokio::test]
async fn test_address_and_name_transitions_agree() {
    init_tracing();
    let by_address = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();
    let by_name = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    let address = "/authors/ada/posts?page=2&utm=mail";
    let target = by_name.address_to_state(address).unwrap();

    let from_address = by_address.transition_to_address(address).await.unwrap();
    let from_name = by_name.transition(&target).await.unwrap();

    assert_eq!(from_address.target(), from_name.target());
    assert_eq!(from_address.dependencies, from_name.dependencies);
    assert_eq!(by_address.current(), by_name.current());
}

#[test]
fn test_constraint_selects_state() {
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();

    assert!(router.address_to_state("/authors/ada/posts/hello-world").is_ok());
    // Upper case is outside the slug constraint and "posts" needs a page.
    assert!(router.address_to_state("/authors/ada/posts/Hello").is_err());
}

// --- Navigation Workflow Tests ---

#[tokio::test]
async fn test_application_navigation_is_picked_up_by_loop() {
    init_tracing();
    let router = Router::new(Blog::default(), RouterConfig::default(), blog_states()).unwrap();
    let dispatcher = Arc::new(Dispatcher::new());
    render_into(&dispatcher, "home");
    render_into(&dispatcher, "authors.post");

    let memory = Arc::new(MemoryHistory::new("https://blog.test/"));
    let history = History::new(memory.clone());
    let navigator = Navigator::new(
        router.clone(),
        Arc::clone(&dispatcher),
        history.clone(),
        NavigatorConfig::default(),
    );

    assert_eq!(navigator.bootstrap().unwrap(), None);
    assert!(matches!(navigator.tick().await, TickOutcome::Transitioned { .. }));

    // The application asks for a state; the loop renders it on the next tick.
    let target = Target::new("authors.post").path("author", "ada").path("slug", "engines");
    let address = format!("https://blog.test{}", router.state_to_url(&target).unwrap());
    history.navigate(
        &address,
        NavigateOptions {
            push: true,
            ..Default::default()
        },
        Some(&router),
    );
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.entry().payload, Some(serde_json::to_value(&target).unwrap()));

    assert!(matches!(navigator.tick().await, TickOutcome::Transitioned { .. }));
    assert_eq!(router.current(), Some(target));

    let rendered = router.context().rendered.lock().clone();
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].starts_with("home"));
    assert!(rendered[1].starts_with("authors.post"));

    // Going back re-renders the previous state.
    assert!(memory.back());
    assert!(matches!(navigator.tick().await, TickOutcome::Transitioned { ref name, .. } if name == "home"));
}

#[tokio::test]
async fn test_fragment_mode_application() {
    init_tracing();
    let config = RouterConfig {
        fragment_mode: true,
        base_path: "/index.html".to_string(),
        ..Default::default()
    };
    let router = Router::new(Blog::default(), config, blog_states()).unwrap();
    let memory = Arc::new(MemoryHistory::new("file://host/index.html"));
    let navigator = Navigator::new(
        router.clone(),
        Arc::new(Dispatcher::new()),
        History::new(memory.clone()),
        NavigatorConfig {
            initial: Some(Target::new("home")),
            ..Default::default()
        },
    );

    // No fragment matches nothing, so the initial state is loaded.
    assert_eq!(
        navigator.bootstrap().unwrap(),
        Some("file://host/index.html#/".to_string())
    );
    assert!(matches!(navigator.tick().await, TickOutcome::Transitioned { ref name, .. } if name == "home"));

    let target = Target::new("authors.posts").path("author", "ada").query("page", "1");
    assert_eq!(
        router.state_to_url(&target).unwrap(),
        "/index.html?page=1#/authors/ada/posts"
    );
    navigator.history().load(&router, &target, false).unwrap();
    assert_eq!(memory.current(), "file://host/index.html?page=1#/authors/ada/posts");

    assert!(matches!(navigator.tick().await, TickOutcome::Transitioned { .. }));
    assert_eq!(router.current(), Some(target));
}
