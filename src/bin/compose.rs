use anyhow::Result;
use futures::StreamExt;
use rpc_compose::codec::{decode_response, encode_request};
use rpc_compose::proto::{AddPost, ById, Empty, Post, PostList};
use rpc_compose::{AppContext, DEV_ENV, MODE_ENV, Mode, app_factory, build_app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mode: Mode = match std::env::var(MODE_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => Mode::default(),
    };
    let is_dev = std::env::var(DEV_ENV).is_ok_and(|value| value == "1");

    let app = build_app(&app_factory(is_dev))?;

    match mode {
        Mode::Schema => println!("{}", app.schema()),
        Mode::Call => {
            let caller = app.caller(AppContext::default());

            let mut added = caller
                .subscription("post.onAdd", encode_request(&Empty {})?)
                .await?;

            for (author_id, title) in [(1, "composing routers"), (2, "no overrides")] {
                let request = AddPost {
                    author_id,
                    title: title.to_string(),
                };
                let post: Post =
                    decode_response(caller.mutation("post.add", encode_request(&request)?).await?)?;
                println!("added post {} by user {}: {}", post.id, post.author_id, post.title);
            }

            for _ in 0..2 {
                if let Some(event) = added.next().await {
                    let post: Post = decode_response(event?)?;
                    println!("post.onAdd -> {}", post.title);
                }
            }

            let list: PostList =
                decode_response(caller.query("post.list", encode_request(&Empty {})?).await?)?;
            println!("post.list -> {} posts", list.posts.len());

            match caller.query("user.byId", encode_request(&ById { id: 42 })?).await {
                Ok(_) => println!("user.byId -> found"),
                Err(err) => println!("user.byId -> {} ({:?})", err.shape.message, err.shape.code),
            }
        }
    }

    Ok(())
}
