// Templates - server-side HTML for every page
// Every value coming from users passes through escape_html before output

use axum::http::StatusCode;
use chrono::{DateTime, Datelike, Utc};
use std::fmt::Write;

use crate::core::Page;
use crate::forms::FormErrors;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{excerpt, Group, GroupId, PostId, PostView, User};
use crate::services::{GroupListing, PostDetail, ProfileListing};

const DETAIL_TITLE_LEN: usize = 30;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain text to paragraphs: blank lines split paragraphs, single newlines
/// become `<br>`.
fn linebreaks(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(|para| format!("<p>{}</p>", escape_html(para).replace('\n', "<br>\n")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d %b %Y").to_string()
}

fn layout(title: &str, viewer: Option<&User>, content: &str) -> String {
    let account = match viewer {
        Some(user) => format!(
            r#"<li class="nav-item"><a class="nav-link" href="/create/">New post</a></li>
        <li class="nav-item"><a class="nav-link" href="/follow/">Following</a></li>
        <li class="nav-item"><a class="nav-link" href="/profile/{username}/">{name}</a></li>"#,
            username = urlencoding::encode(&user.username),
            name = escape_html(user.name()),
        ),
        None => r#"<li class="nav-item"><a class="nav-link" href="/auth/login/">Log in</a></li>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body>
  <header>
    <nav class="navbar">
      <a class="navbar-brand" href="/">Yatube</a>
      <ul class="nav">
        <li class="nav-item"><a class="nav-link" href="/">Home</a></li>
        {account}
      </ul>
    </nav>
  </header>
  <main class="container">
{content}
  </main>
  <footer class="footer">
    <p>&copy; {year} Copyright <span>Yatube</span></p>
  </footer>
</body>
</html>
"#,
        title = escape_html(title),
        account = account,
        content = content,
        year = Utc::now().year(),
    )
}

fn post_card(view: &PostView, show_group_link: bool) -> String {
    let post = &view.post;
    let mut html = String::from("<article class=\"post\">\n  <ul class=\"post-meta\">\n");
    let _ = writeln!(
        html,
        r#"    <li>Author: <a href="/profile/{}/">{}</a></li>"#,
        urlencoding::encode(&view.author.username),
        escape_html(view.author.name())
    );
    let _ = writeln!(html, "    <li>Date: {}</li>", format_date(&post.pub_date));
    html.push_str("  </ul>\n");

    if let Some(image) = &post.image {
        let _ = writeln!(
            html,
            r#"  <img class="card-img" src="/media/{}" alt="">"#,
            escape_html(image)
        );
    }
    let _ = writeln!(html, "  {}", linebreaks(&post.text));
    let _ = writeln!(html, r#"  <a href="/posts/{}/">Details</a>"#, post.id);

    if show_group_link {
        if let Some(group) = &view.group {
            let _ = writeln!(
                html,
                r#"  <a class="group-link" href="/group/{}/">All posts of group {}</a>"#,
                urlencoding::encode(&group.slug),
                escape_html(&group.title)
            );
        }
    }
    html.push_str("</article>\n<hr>\n");
    html
}

fn pagination_nav<T>(page: &Page<T>) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let mut html = String::from("<nav class=\"pagination\">\n  <ul>\n");
    if let Some(previous) = page.previous_page_number() {
        html.push_str("    <li><a href=\"?page=1\">First</a></li>\n");
        let _ = writeln!(html, r#"    <li><a href="?page={0}">{0}</a></li>"#, previous);
    }
    let _ = writeln!(html, r#"    <li class="active">{}</li>"#, page.number);
    if let Some(next) = page.next_page_number() {
        let _ = writeln!(html, r#"    <li><a href="?page={0}">{0}</a></li>"#, next);
        let _ = writeln!(html, r#"    <li><a href="?page={}">Last</a></li>"#, page.num_pages);
    }
    html.push_str("  </ul>\n</nav>\n");
    html
}

fn post_list(page: &Page<PostView>, show_group_link: bool) -> String {
    let mut html: String = page
        .items
        .iter()
        .map(|view| post_card(view, show_group_link))
        .collect();
    html.push_str(&pagination_nav(page));
    html
}

pub fn index_page(vc: &ViewerContext, page: &Page<PostView>) -> String {
    let content = format!(
        "<h1>Latest updates</h1>\n{}",
        post_list(page, true)
    );
    layout("Latest updates", vc.user.as_ref(), &content)
}

pub fn group_page(vc: &ViewerContext, listing: &GroupListing) -> String {
    let group = &listing.group;
    let content = format!(
        "<h1>{}</h1>\n<p>{}</p>\n{}",
        escape_html(&group.title),
        escape_html(&group.description),
        post_list(&listing.page, false)
    );
    layout(
        &format!("Posts of group {}", group.title),
        vc.user.as_ref(),
        &content,
    )
}

pub fn profile_page(vc: &ViewerContext, listing: &ProfileListing) -> String {
    let author = &listing.author;
    let username = urlencoding::encode(&author.username);

    let mut content = format!(
        r#"<div class="profile">
  <h1>All posts of user {name}</h1>
  <h3>Total posts: {posts}</h3>
  <p>Followers: {followers} | Following: {following}</p>
"#,
        name = escape_html(author.name()),
        posts = listing.post_count,
        followers = listing.follower_count,
        following = listing.following_count,
    );

    let is_self = vc.user_id() == Some(author.id);
    if vc.is_authenticated() && !is_self {
        let (action, label) = if listing.is_following {
            ("unfollow", "Unfollow")
        } else {
            ("follow", "Follow")
        };
        let _ = writeln!(
            content,
            r#"  <form method="post" action="/profile/{}/{}/"><button type="submit" class="btn">{}</button></form>"#,
            username, action, label
        );
    }
    content.push_str("</div>\n");
    content.push_str(&post_list(&listing.page, true));

    layout(
        &format!("Profile of {}", author.name()),
        vc.user.as_ref(),
        &content,
    )
}

pub fn follow_page(vc: &ViewerContext, page: &Page<PostView>) -> String {
    let body = if page.is_empty() {
        "<p>Posts by the authors you follow will appear here.</p>\n".to_string()
    } else {
        post_list(page, true)
    };
    let content = format!("<h1>Your subscriptions</h1>\n{}", body);
    layout("Your subscriptions", vc.user.as_ref(), &content)
}

pub fn post_detail_page(vc: &ViewerContext, detail: &PostDetail) -> String {
    let view = &detail.post;
    let post = &view.post;

    let mut content = String::from("<div class=\"row\">\n<aside class=\"post-meta\">\n  <ul>\n");
    let _ = writeln!(content, "    <li>Date: {}</li>", format_date(&post.pub_date));
    if let Some(group) = &view.group {
        let _ = writeln!(
            content,
            r#"    <li>Group: {} <a href="/group/{}/">all posts of the group</a></li>"#,
            escape_html(&group.title),
            urlencoding::encode(&group.slug)
        );
    }
    let _ = writeln!(
        content,
        r#"    <li>Author: {}</li>
    <li>Total posts by author: <span>{}</span></li>
    <li><a href="/profile/{}/">all posts of the user</a></li>"#,
        escape_html(view.author.name()),
        detail.author_post_count,
        urlencoding::encode(&view.author.username)
    );
    content.push_str("  </ul>\n</aside>\n<article class=\"post\">\n");

    if let Some(image) = &post.image {
        let _ = writeln!(
            content,
            r#"  <img class="card-img" src="/media/{}" alt="">"#,
            escape_html(image)
        );
    }
    let _ = writeln!(content, "  {}", linebreaks(&post.text));
    if vc.user_id() == Some(post.author_id) {
        let _ = writeln!(
            content,
            r#"  <a class="btn" href="/posts/{}/edit/">Edit post</a>"#,
            post.id
        );
    }
    content.push_str("</article>\n</div>\n");

    content.push_str("<section class=\"comments\">\n");
    if vc.is_authenticated() {
        let _ = writeln!(
            content,
            r#"  <form method="post" action="/posts/{}/comment/">
    <label for="id_text">Add a comment</label>
    <textarea name="text" id="id_text" class="form-control" required></textarea>
    <button type="submit" class="btn">Send</button>
  </form>"#,
            post.id
        );
    }
    for comment in &detail.comments {
        let _ = writeln!(
            content,
            r#"  <div class="comment">
    <h5><a href="/profile/{}/">{}</a></h5>
    {}
  </div>"#,
            urlencoding::encode(&comment.author.username),
            escape_html(comment.author.name()),
            linebreaks(&comment.comment.text)
        );
    }
    content.push_str("</section>\n");

    let title = format!("Post {}", excerpt(&post.text, DETAIL_TITLE_LEN));
    layout(&title, vc.user.as_ref(), &content)
}

/// Values the create and edit forms are rendered with.
pub struct PostFormContext<'a> {
    pub text: &'a str,
    pub group_id: Option<GroupId>,
    pub image: Option<&'a str>,
    pub groups: &'a [Group],
    pub errors: &'a FormErrors,
    /// Set when editing an existing post.
    pub post_id: Option<PostId>,
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .field(field)
        .iter()
        .map(|message| format!(r#"<div class="invalid-feedback">{}</div>"#, escape_html(message)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn post_form_page(vc: &ViewerContext, form: &PostFormContext<'_>) -> String {
    let (heading, action, button) = match form.post_id {
        Some(id) => ("Edit post", format!("/posts/{}/edit/", id), "Save"),
        None => ("New post", "/create/".to_string(), "Add"),
    };

    let mut options = String::from("      <option value=\"\">---------</option>\n");
    for group in form.groups {
        let selected = if form.group_id == Some(group.id) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            options,
            r#"      <option value="{}"{}>{}</option>"#,
            group.id,
            selected,
            escape_html(&group.title)
        );
    }

    let current_image = match (form.post_id, form.image) {
        (Some(_), Some(image)) => format!(
            r#"    <p>Currently: <a href="/media/{0}">{0}</a>
      <input type="checkbox" name="image-clear" id="image-clear_id">
      <label for="image-clear_id">Clear</label></p>
"#,
            escape_html(image)
        ),
        _ => String::new(),
    };

    let content = format!(
        r#"<div class="card">
  <h1 class="card-header">{heading}</h1>
  <form method="post" action="{action}" enctype="multipart/form-data">
    <div class="form-group">
      <label for="id_text">Text</label>
      <textarea name="text" id="id_text" class="form-control" required>{text}</textarea>
      {text_errors}
    </div>
    <div class="form-group">
      <label for="id_group">Group</label>
      <select name="group" id="id_group" class="form-control">
{options}      </select>
      {group_errors}
    </div>
    <div class="form-group">
      <label for="id_image">Image</label>
{current_image}      <input type="file" name="image" id="id_image" class="form-control" accept="image/*">
      {image_errors}
    </div>
    <button type="submit" class="btn btn-primary">{button}</button>
  </form>
</div>
"#,
        heading = heading,
        action = action,
        text = escape_html(form.text),
        text_errors = field_errors(form.errors, "text"),
        options = options,
        group_errors = field_errors(form.errors, "group"),
        current_image = current_image,
        image_errors = field_errors(form.errors, "image"),
        button = button,
    );
    layout(heading, vc.user.as_ref(), &content)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let content = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<a href=\"/\">Back to the main page</a>\n",
        status.as_u16(),
        escape_html(message)
    );
    let title = status.canonical_reason().unwrap_or("Error");
    layout(title, None, &content)
}
