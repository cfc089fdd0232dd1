use crate::dashboard::{DashboardState, ToggleMode};
use crate::models::{Goal, Member};

pub const SELF_LABEL: &str = "YOU";
pub const LOADING_ROWS: usize = 3;

pub struct DashboardView<'a> {
    pub state: &'a DashboardState,
    pub user_id: &'a str,
    pub selected: Option<&'a str>,
    pub toggle_mode: ToggleMode,
    pub alert: Option<&'a str>,
}

/// Tab shown when none was picked: the viewer, else the first member.
pub fn selected_tab<'a>(members: &'a [Member], user_id: &'a str, requested: Option<&'a str>) -> Option<&'a str> {
    if let Some(requested) = requested {
        if members.iter().any(|member| member.user_id == requested) {
            return Some(requested);
        }
    }
    if members.iter().any(|member| member.user_id == user_id) {
        return Some(user_id);
    }
    members.first().map(|member| member.user_id.as_str())
}

pub fn tab_label<'a>(member: &'a Member, user_id: &str) -> &'a str {
    if member.user_id == user_id {
        return SELF_LABEL;
    }
    member.full_name.split_whitespace().next().unwrap_or(&member.full_name)
}

pub fn empty_state_text(is_viewing_me: bool) -> &'static str {
    if is_viewing_me {
        "No habits yet. Add one above!"
    } else {
        "They haven't added any habits yet."
    }
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let state = view.state;
    let selected = selected_tab(&state.members, view.user_id, view.selected);
    let is_viewing_me = selected == Some(view.user_id);
    let goals: &[Goal] = selected
        .and_then(|id| state.member(id))
        .map(|member| member.goals.as_slice())
        .unwrap_or(&[]);

    let mut body = String::new();
    body.push_str(&render_alert(view.alert));
    body.push_str(&render_header(state));
    body.push_str(&render_tabs(&state.members, view.user_id, selected));
    body.push_str("<section class=\"list\">");
    body.push_str("<form method=\"post\" action=\"/refresh\"><button class=\"btn-ghost\" type=\"submit\">Refresh</button></form>");
    if is_viewing_me {
        body.push_str(&render_add_input());
    }
    body.push_str(&render_goal_list(goals, is_viewing_me, state.loading, view.toggle_mode));
    body.push_str("</section>");

    PAGE_HTML
        .replace("{{TITLE}}", &escape_html(state.group_name()))
        .replace("{{BODY}}", &body)
}

fn render_alert(alert: Option<&str>) -> String {
    match alert {
        Some(message) => format!("<div class=\"alert\" role=\"alert\">{}</div>", escape_html(message)),
        None => String::new(),
    }
}

pub fn render_header(state: &DashboardState) -> String {
    let waiting = if state.is_waiting {
        "<span class=\"waiting\">Waiting...</span>"
    } else {
        ""
    };
    let icon = if state.is_waiting { "&#9203;" } else { "&#128293;" };
    let code = escape_html(state.invite_code());
    format!(
        r#"<header>
  <div>
    <span class="label">{name}</span>
    <button class="invite" type="button" data-code="{code}" onclick="navigator.clipboard.writeText(this.dataset.code).then(() => alert('Code ' + this.dataset.code + ' copied.'))">Invite: {code} &#128203;</button>
  </div>
  <div class="streak{waiting_class}">
    {waiting}
    <span class="day">Day {streak}</span>
    <span class="icon">{icon}</span>
  </div>
</header>"#,
        name = escape_html(state.group_name()),
        code = code,
        waiting_class = if state.is_waiting { " is-waiting" } else { "" },
        waiting = waiting,
        streak = state.streak,
        icon = icon,
    )
}

pub fn render_tabs(members: &[Member], user_id: &str, selected: Option<&str>) -> String {
    let tabs: String = members
        .iter()
        .map(|member| {
            let active = if Some(member.user_id.as_str()) == selected { " active" } else { "" };
            format!(
                "<a class=\"tab{active}\" href=\"/?member={id}\">{label}</a>",
                id = escape_html(&member.user_id),
                label = escape_html(tab_label(member, user_id)),
            )
        })
        .collect();
    format!("<nav class=\"tabs\">{tabs}</nav>")
}

pub fn render_goal_list(goals: &[Goal], is_viewing_me: bool, loading: bool, mode: ToggleMode) -> String {
    if loading {
        return format!(
            "<div class=\"goals\">{}</div>",
            "<div class=\"goal skeleton\"></div>".repeat(LOADING_ROWS)
        );
    }
    if goals.is_empty() {
        return format!("<p class=\"empty\">{}</p>", empty_state_text(is_viewing_me));
    }

    let items: String = goals
        .iter()
        .map(|goal| render_goal(goal, is_viewing_me, mode))
        .collect();
    format!("<div class=\"goals\">{items}</div>")
}

fn render_goal(goal: &Goal, is_viewing_me: bool, mode: ToggleMode) -> String {
    let class = match (goal.completed_today, is_viewing_me) {
        (true, true) => "goal done mine",
        (true, false) => "goal done theirs",
        (false, true) => "goal mine",
        (false, false) => "goal theirs",
    };
    let mark = match (goal.completed_today, is_viewing_me) {
        (true, true) => "&#9989;",
        (true, false) => "&#128293;",
        _ => "",
    };
    let id = escape_html(&goal.id);
    let title = escape_html(&goal.title);

    if !is_viewing_me {
        return format!("<div class=\"{class}\"><span class=\"title\">{title}</span><span>{mark}</span></div>");
    }

    let locked = goal.completed_today && mode == ToggleMode::Lock;
    let disabled = if locked { " disabled" } else { "" };
    format!(
        r#"<div class="{class}">
  <form method="post" action="/goals/{id}/toggle"><button class="toggle" type="submit"{disabled}><span class="title">{title}</span><span>{mark}</span></button></form>
  <details class="swipe">
    <summary>&#8943;</summary>
    <form method="post" action="/goals/{id}/rename"><input name="title" value="{title}" /><button type="submit">Save</button></form>
    <form method="post" action="/goals/{id}/delete"><button class="danger" type="submit">Delete</button></form>
  </details>
</div>"#
    )
}

pub fn render_add_input() -> String {
    r#"<form class="add" method="post" action="/goals" onsubmit="this.querySelector('button').disabled = true; this.querySelector('input').readOnly = true;">
  <input name="title" placeholder="+ Add a new habit..." autocomplete="off" />
  <button type="submit">Add</button>
</form>"#
        .to_string()
}

pub fn render_join(create_mode: bool, alert: Option<&str>) -> String {
    let (heading, subtitle, form, switch) = if create_mode {
        (
            "Start a Squad",
            "Create a new group and invite your friends.",
            r#"<form method="post" action="/groups"><input name="name" placeholder="Group Name (e.g. Swole Mates)" /><button type="submit">Create Group</button></form>"#,
            r#"<a href="/join?mode=join">Have a code? Join instead</a>"#,
        )
    } else {
        (
            "Join a Squad",
            "Enter the invite code shared by your friend.",
            r#"<form method="post" action="/join"><input name="code" placeholder="e.g. A8X-992" class="code" /><button type="submit">Join Group</button></form>"#,
            r#"<a href="/join?mode=create">No code? Create a new group</a>"#,
        )
    };
    let body = format!(
        "{alert}<section class=\"onboarding\"><h1>{heading}</h1><p class=\"subtitle\">{subtitle}</p>{form}{switch}</section>",
        alert = render_alert(alert),
    );
    PAGE_HTML.replace("{{TITLE}}", heading).replace("{{BODY}}", &body)
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --ink: #1e293b;
      --muted: #94a3b8;
      --accent: #4f46e5;
      --done: #16a34a;
      --card: #ffffff;
      --shadow: 0 12px 30px rgba(15, 23, 42, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: #f8fafc;
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: flex-start;
      padding: 48px 24px 24px;
      background: #0f172a;
      color: white;
    }

    .label {
      display: block;
      font-size: 0.75rem;
      font-weight: 700;
      letter-spacing: 0.12em;
      text-transform: uppercase;
      color: var(--muted);
    }

    .invite {
      margin-top: 6px;
      border: none;
      border-radius: 999px;
      padding: 4px 12px;
      background: var(--accent);
      color: white;
      font-weight: 700;
      cursor: pointer;
    }

    .streak {
      display: grid;
      justify-items: end;
    }

    .streak .day {
      font-size: 2rem;
      font-weight: 700;
    }

    .streak.is-waiting .day {
      color: #fef08a;
    }

    .waiting {
      font-size: 0.65rem;
      font-weight: 700;
      text-transform: uppercase;
      color: #facc15;
    }

    .tabs {
      display: flex;
      border-bottom: 1px solid #f1f5f9;
      background: white;
    }

    .tab {
      flex: 1;
      padding: 16px;
      text-align: center;
      font-weight: 700;
      color: var(--muted);
      text-decoration: none;
      border-bottom: 2px solid transparent;
    }

    .tab.active {
      color: var(--accent);
      border-bottom-color: var(--accent);
    }

    .list {
      display: grid;
      gap: 12px;
      padding: 16px;
    }

    .goals {
      display: grid;
      gap: 12px;
    }

    .goal {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 8px;
      padding: 16px 20px;
      border-radius: 14px;
      border: 1px solid #e2e8f0;
      background: var(--card);
      box-shadow: var(--shadow);
    }

    .goal.done.mine {
      background: #f0fdf4;
      border-color: var(--done);
    }

    .goal.done.theirs {
      background: #eef2ff;
      border-color: #c7d2fe;
    }

    .goal.theirs .title {
      color: var(--muted);
    }

    .goal.skeleton {
      height: 64px;
      background: #f1f5f9;
      border-color: transparent;
      box-shadow: none;
      opacity: 0.5;
    }

    .toggle {
      flex: 1;
      display: flex;
      justify-content: space-between;
      border: none;
      background: transparent;
      font-size: 1.1rem;
      cursor: pointer;
    }

    .toggle:disabled {
      cursor: default;
    }

    .add {
      display: flex;
      gap: 8px;
    }

    .add input,
    .onboarding input {
      flex: 1;
      padding: 14px;
      border-radius: 12px;
      border: 1px solid #e2e8f0;
      background: #f9fafb;
      font-size: 1rem;
    }

    button {
      border: none;
      border-radius: 12px;
      padding: 10px 18px;
      background: #0f172a;
      color: white;
      font-weight: 700;
    }

    .btn-ghost {
      background: transparent;
      color: var(--accent);
    }

    .danger {
      background: #dc2626;
    }

    .empty {
      margin-top: 40px;
      padding: 24px;
      text-align: center;
      font-style: italic;
      color: var(--muted);
      border: 1px dashed #e2e8f0;
      border-radius: 14px;
    }

    .alert {
      padding: 12px 24px;
      background: #fee2e2;
      color: #991b1b;
      font-weight: 600;
    }

    .onboarding {
      display: grid;
      gap: 16px;
      max-width: 420px;
      margin: 80px auto;
      padding: 24px;
      text-align: center;
    }

    .onboarding form {
      display: grid;
      gap: 12px;
    }

    .onboarding .code {
      text-align: center;
      font-size: 1.5rem;
      letter-spacing: 0.2em;
      text-transform: uppercase;
    }

    .subtitle {
      margin: 0;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main class="app">{{BODY}}</main>
</body>
</html>
"#;
