use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use snapshare::api::{ApiClient, ApiError, ProfileEdit};
use snapshare::feed::FeedState;
use snapshare::health::{HealthChecker, WarmUpPolicy};
use snapshare::logging::{init_logging, LogConfig};
use snapshare::session::SessionStore;
use snapshare_types::{CommentView, PostView, User};

/// SnapShare - share photos from the terminal
#[derive(Parser)]
#[command(name = "snapshare")]
#[command(about = "Command-line client for the SnapShare photo-sharing platform")]
#[command(version)]
struct Cli {
    /// Server URL to connect to
    #[arg(
        long,
        short,
        env = "SNAPSHARE_SERVER_URL",
        default_value = "http://localhost:4000"
    )]
    server: String,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write debug logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "SNAPSHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in with a username or email
    Login {
        identifier: String,
        #[arg(long, env = "SNAPSHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show every post, newest first
    Feed,
    /// Show a user's profile and posts
    User { username: String },
    /// Publish a post from an image URL or a local file
    Post {
        /// Upload this file first and post the hosted copy
        #[arg(long, conflicts_with = "image_url")]
        file: Option<PathBuf>,
        #[arg(long, required_unless_present = "file")]
        image_url: Option<String>,
        #[arg(long)]
        caption: Option<String>,
    },
    /// Like a post, or remove your like
    Like { post_id: i64 },
    /// Comment on a post
    Comment { post_id: i64, text: String },
    /// List the comments on a post
    Comments { post_id: i64 },
    /// Delete one of your posts
    Delete { post_id: i64 },
    /// Show a profile; your own when no username is given
    Profile { username: Option<String> },
    /// Change your profile; omitted fields keep their current value
    EditProfile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        bio: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// List every user
    Users,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_verbosity(cli.verbose);
    if let Some(path) = &cli.log_file {
        log_config = log_config.with_log_file(path.clone());
    }
    init_logging(&log_config)?;

    let session = SessionStore::new()?;
    let mut client = ApiClient::new(&cli.server);
    if let Some((token, claims)) = session.load_valid(Utc::now().timestamp())? {
        log::debug!("Restored session for {}", claims.username);
        client.set_token(Some(token));
    }

    let logging_in = matches!(cli.command, Command::Login { .. } | Command::Signup { .. });
    let result = run(cli.command, &mut client, &session).await;
    if let Err(err) = &result {
        if let Some(api_err) = err.downcast_ref::<ApiError>() {
            if !logging_in && session.clear_on_rejection(api_err)? {
                bail!("{}\nYour session is no longer valid. Log in again.", err);
            }
        }
    }
    result
}

async fn run(command: Command, client: &mut ApiClient, session: &SessionStore) -> Result<()> {
    match command {
        Command::Signup {
            name,
            username,
            email,
            password,
        } => {
            warm_up(client).await?;
            let payload = client.signup(&name, &username, &email, &password).await?;
            session.save(&payload.token)?;
            println!("Welcome, {}! You are logged in as @{}.", payload.user.name, payload.user.username);
        }
        Command::Login {
            identifier,
            password,
        } => {
            warm_up(client).await?;
            let payload = client.login(&identifier, &password).await?;
            session.save(&payload.token)?;
            println!("Logged in as @{}.", payload.user.username);
        }
        Command::Logout => {
            session.delete()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            require_session(client)?;
            match client.me().await? {
                Some(user) => print_user(&user),
                None => println!("Your account no longer exists."),
            }
        }
        Command::Feed => {
            let posts = client.all_posts().await?;
            if posts.is_empty() {
                println!("No posts yet.");
            }
            for post in &posts {
                print_post(post);
            }
        }
        Command::User { username } => {
            let user = client
                .user_profile(Some(username.as_str()))
                .await?
                .with_context(|| format!("No user named @{}", username))?;
            print_user(&user);
            let posts = client.posts_by_user(user.id).await?;
            println!("{} post(s)", posts.len());
            for post in &posts {
                print_post(post);
            }
        }
        Command::Post {
            file,
            image_url,
            caption,
        } => {
            require_session(client)?;
            let image_url = match (file, image_url) {
                (Some(path), _) => {
                    let url = client.upload_image(&path).await?;
                    println!("Uploaded {} to {}", path.display(), url);
                    url
                }
                (None, Some(url)) => url,
                (None, None) => bail!("Provide --image-url or --file"),
            };
            let post = client.create_post(&image_url, caption.as_deref()).await?;
            println!("Created post {}.", post.id);
            print_post(&post);
        }
        Command::Like { post_id } => {
            require_session(client)?;
            toggle_like(client, post_id).await?;
        }
        Command::Comment { post_id, text } => {
            require_session(client)?;
            let comment = client.add_comment(post_id, &text).await?;
            print_comment(&comment);
        }
        Command::Comments { post_id } => {
            let comments = client.comments_by_post(post_id).await?;
            if comments.is_empty() {
                println!("No comments on post {}.", post_id);
            }
            for comment in &comments {
                print_comment(comment);
            }
        }
        Command::Delete { post_id } => {
            require_session(client)?;
            let result = client.delete_post(post_id).await?;
            if result.success {
                println!("{}", result.message);
            } else {
                bail!("{}", result.message);
            }
        }
        Command::Profile { username } => match client.user_profile(username.as_deref()).await? {
            Some(user) => print_user(&user),
            None if username.is_none() => println!("Not logged in."),
            None => println!("No such user."),
        },
        Command::EditProfile {
            name,
            username,
            email,
            bio,
            avatar_url,
        } => {
            require_session(client)?;
            let current = client
                .me()
                .await?
                .context("Your account no longer exists")?;
            let edit = ProfileEdit {
                name: name.unwrap_or(current.name),
                username: username.unwrap_or(current.username),
                email: email.unwrap_or(current.email),
                bio,
                avatar_url,
            };
            let user = client.update_profile(&edit).await?;
            println!("Profile updated.");
            print_user(&user);
        }
        Command::Users => {
            for user in client.all_users().await? {
                println!("{:>5}  @{:<30} {}", user.id, user.username, user.name);
            }
        }
    }
    Ok(())
}

fn require_session(client: &ApiClient) -> Result<()> {
    if client.token().is_none() {
        bail!("You are not logged in. Run `snapshare login` first.");
    }
    Ok(())
}

async fn warm_up(client: &ApiClient) -> Result<()> {
    let mut checker = HealthChecker::new(WarmUpPolicy::default());
    log::info!("Connecting to {}...", client.base_url());
    checker.ensure_server_ready(client).await?;
    Ok(())
}

/// Show the like immediately, then reconcile with the server's answer
async fn toggle_like(client: &ApiClient, post_id: i64) -> Result<()> {
    let mut feed = FeedState::new(client.all_posts().await?);
    let pending = feed
        .toggle_like_optimistic(post_id)
        .with_context(|| format!("Post {} not found", post_id))?;
    if let Some(post) = feed.get(post_id) {
        println!(
            "{} post {} ({} likes)",
            if pending.now_liked() { "Liking" } else { "Unliking" },
            post_id,
            post.like_count
        );
    }

    match client.toggle_like(post_id).await {
        Ok(server_post) => {
            feed.confirm(pending, server_post);
            if let Some(post) = feed.get(post_id) {
                println!(
                    "{} post {} ({} likes)",
                    if post.liked_by_current_user { "Liked" } else { "Unliked" },
                    post_id,
                    post.like_count
                );
            }
            Ok(())
        }
        Err(err) => {
            feed.rollback(pending);
            Err(err.into())
        }
    }
}

fn print_user(user: &User) {
    println!("@{} ({})", user.username, user.name);
    println!("  id:      {}", user.id);
    println!("  email:   {}", user.email);
    if let Some(bio) = &user.bio {
        println!("  bio:     {}", bio);
    }
    if let Some(avatar) = &user.avatar_url {
        println!("  avatar:  {}", avatar);
    }
    println!("  joined:  {}", user.created_at.format("%Y-%m-%d"));
}

fn print_post(post: &PostView) {
    println!();
    println!(
        "#{} by @{} on {}",
        post.id,
        post.author.username,
        post.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("  {}", post.image_url);
    if let Some(caption) = &post.caption {
        println!("  {}", caption);
    }
    println!(
        "  {} like(s){}, {} comment(s)",
        post.like_count,
        if post.liked_by_current_user { " (including you)" } else { "" },
        post.comments.len()
    );
}

fn print_comment(comment: &CommentView) {
    let author = comment
        .author
        .as_ref()
        .map(|u| u.username.as_str())
        .unwrap_or("unknown");
    println!(
        "[{}] @{} ({}): {}",
        comment.id,
        author,
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.text
    );
}
