//! Bundled seed dataset.
//!
//! Default content used to initialize an empty backend so the site is never
//! blank on first run, and served as the read fallback when the remote store
//! is unreachable. Shape is identical to the live schema.

use crate::models::{Comment, Post};

pub fn default_posts() -> Vec<Post> {
    vec![
        Post {
            id: "welcome-to-my-blog".to_string(),
            title: "Welcome to my personal blog".to_string(),
            excerpt: "Thanks for stopping by! This space is where I share DevOps lessons, \
                      side projects, and things that make me curious."
                .to_string(),
            content: "## Hello there\n\n\
                      I set up this little corner of the web to track my learning and experiments.\n\n\
                      - DevOps tips and hard lessons\n\
                      - Cloud things that made me go \"oh wow\"\n\
                      - Personal notes so future me remembers what current me figured out\n\n\
                      If any of that sounds interesting, feel free to hang around."
                .to_string(),
            cover_image: String::new(),
            published: true,
            published_date: "2025-01-10".to_string(),
            reading_time: 3,
            tags: vec!["welcome".to_string(), "devops".to_string()],
            created_at: "2025-01-10T09:00:00+00:00".to_string(),
            updated_at: "2025-01-10T09:00:00+00:00".to_string(),
        },
        Post {
            id: "capturing-ideas-quickly".to_string(),
            title: "Capturing ideas quickly so they do not drift away".to_string(),
            excerpt: "I keep a lightweight workflow that mixes notes, VS Code, and tiny \
                      scripts to move ideas into action."
                .to_string(),
            content: "### Why I care\n\n\
                      Ideas vanish fast. A friendly system helps me record them without overthinking.\n\n\
                      ### My simple workflow\n\n\
                      1. Brain dump into the notes app on the iPad.\n\
                      2. Promote the solid ideas into a Markdown inbox.\n\
                      3. Schedule a small review session each Friday.\n\n\
                      It is not perfect, but it keeps momentum without a lot of overhead."
                .to_string(),
            cover_image: String::new(),
            published: true,
            published_date: "2025-02-02".to_string(),
            reading_time: 4,
            tags: vec!["productivity".to_string(), "notes".to_string()],
            created_at: "2025-02-02T09:00:00+00:00".to_string(),
            updated_at: "2025-02-02T09:00:00+00:00".to_string(),
        },
    ]
}

pub fn default_comments() -> Vec<Comment> {
    vec![
        Comment {
            id: "seed-comment-welcome-1".to_string(),
            post_id: "welcome-to-my-blog".to_string(),
            author: "Site Owner".to_string(),
            content: "Glad to have you here. Say hello below!".to_string(),
            email: None,
            created_at: "2025-01-11T10:30:00+00:00".to_string(),
        },
        Comment {
            id: "seed-comment-welcome-2".to_string(),
            post_id: "welcome-to-my-blog".to_string(),
            author: "Anonymous".to_string(),
            content: "Looking forward to the DevOps posts.".to_string(),
            email: None,
            created_at: "2025-01-12T08:15:00+00:00".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_posts_are_well_formed() {
        let posts = default_posts();
        assert!(!posts.is_empty());
        for post in &posts {
            assert!(!post.id.is_empty());
            assert!(!post.title.is_empty());
            assert!(!post.content.is_empty());
            assert!(post.reading_time >= 1);
            assert!(post.published);
        }
    }

    #[test]
    fn test_seed_comments_reference_seed_posts() {
        let post_ids: Vec<String> = default_posts().into_iter().map(|p| p.id).collect();
        for comment in default_comments() {
            assert!(post_ids.contains(&comment.post_id));
            assert!(!comment.content.trim().is_empty());
        }
    }
}
