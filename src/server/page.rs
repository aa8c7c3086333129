//! HTML pages: the board and a developer's update form.

use crate::board::DevTask;
use crate::view::{BlockerRow, BoardHeader, RenderedView, StatusCell, StatusKind, TaskRow};

const NBSP: &str = "&nbsp;";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn mark(class: &str, body: &str) -> String {
    format!("<mark class=\"{}\">{}</mark>", class, body)
}

/// Progress bar markup for one status cell.
pub fn status_markup(cell: &StatusCell) -> String {
    let mut out = match cell.kind {
        StatusKind::NoProgress => mark("dark", "[0]"),
        StatusKind::Gain => {
            let mut s = String::new();
            if cell.previous > 0 {
                s.push_str(&mark(
                    "medium",
                    &format!("{}{}", NBSP.repeat(cell.base_padding()), cell.previous),
                ));
            }
            s.push_str(&mark(
                "light",
                &format!("{}{}", NBSP.repeat(cell.gain_padding()), cell.gain),
            ));
            s.push_str(&mark("dark", &format!("[{}]", cell.displayed)));
            s
        }
        StatusKind::Steady | StatusKind::Regression => {
            let mut s = mark(
                "medium",
                &format!("{}{}", NBSP.repeat(cell.base_padding()), cell.previous),
            );
            s.push_str(&mark("dark", &format!("[{}]", cell.displayed)));
            if cell.kind == StatusKind::Regression {
                s.push_str(&mark(
                    "orange",
                    &format!("&lt;{}{}{}", "-".repeat(cell.regression_dashes()), cell.gain, NBSP),
                ));
            }
            s
        }
    };
    if cell.blocked {
        out.push_str(&mark("red", "Blocked"));
    }
    out
}

fn issue_link(issue: u64, url: Option<&str>) -> String {
    match url {
        Some(url) => format!(
            "<a href=\"{}\" target=\"blank\">{}</a>",
            escape(url),
            issue
        ),
        None => issue.to_string(),
    }
}

fn task_row(row: &TaskRow, stripe: usize) -> String {
    let description = escape(&row.description);
    let description = if row.today {
        mark("today", &description)
    } else {
        description
    };
    format!(
        "<tr class=\"row{}\"><td class=\"f1\">{}</td><td class=\"f2\">{}</td><td class=\"f3\">{}</td><td class=\"f4\">{}</td></tr>\n",
        stripe % 2 + 1,
        escape(&row.developer),
        issue_link(row.issue, row.issue_url.as_deref()),
        description,
        status_markup(&row.status)
    )
}

fn blocker_item(row: &BlockerRow) -> String {
    format!(
        "<li>{}</li>\n",
        mark(
            "dark_red",
            &format!(
                "{}: {}: {}: {}",
                escape(&row.developer),
                issue_link(row.issue, row.issue_url.as_deref()),
                escape(&row.description),
                escape(&row.blocker)
            )
        )
    )
}

const BOARD_STYLE: &str = r#"
body { font-family: monospace; margin: 0; background: #f4f4f4; }
.top_frame { height: 22%; }
.nav_container { display: flex; gap: 4em; }
table.scrum { border-spacing: 0.1em; width: 100%; }
tr.row1 { background: #ffffff; }
tr.row2 { background: #eeeeee; }
td { white-space: nowrap; }
mark.dark { background: #4d4d4d; color: #ffffff; }
mark.medium { background: #9a9a9a; color: #ffffff; }
mark.light { background: #c6e5b3; color: #1a3300; }
mark.dark_red { background: #ffe6e6; color: #800000; }
mark.red { background: #cc0000; color: #ffffff; margin-left: 1em; }
mark.orange { background: #ff9933; color: #331a00; }
mark.today { background: #fff0b3; }
.mid_frame, .bottom_frame { overflow-y: auto; }
"#;

/// The status board under the current cursor.
pub fn board_page(header: &BoardHeader, view: &RenderedView) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Sprint View: {}</title>\n", escape(&header.project)));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", BOARD_STYLE));

    html.push_str("<div class=\"top_frame\">\n<h2 class=\"title_header\">SPRINT VIEW</h2>\n");
    html.push_str("<div class=\"button_wrap\">\n");
    html.push_str("<a href=\"/last\">LAST</a> <a href=\"/reload\">RELOAD</a>\n");
    if header.sprint_active {
        html.push_str(&post_button("/close_sprint", "CLOSE SPRINT"));
        if header.scrum_active {
            html.push_str(&post_button("/close_scrum", "CLOSE SCRUM"));
        } else {
            html.push_str(&post_button("/new_scrum", "OPEN SCRUM"));
        }
    } else {
        html.push_str(&post_button("/new_sprint", "OPEN SPRINT"));
    }
    for dev in &header.developers {
        html.push_str(&format!(
            "<a class=\"update\" href=\"/devel/{}\">{}</a>\n",
            escape(dev),
            escape(dev)
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<div class=\"nav_container\">\n");
    html.push_str(&format!(
        "<div class=\"scrum_nav_frame\"><h2> Scrum: {} of {}</h2><a href=\"/prev_scrum\">&lt;</a> <a href=\"/next_scrum\">&gt;</a>",
        header.scrum, header.num_scrums
    ));
    if !header.scrum_active {
        html.push_str(&format!(
            "<p class=\"noscrum\">{}{}</p>",
            NBSP.repeat(2),
            mark("red", "No Active Scrum")
        ));
    }
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<div class=\"sprint_nav_frame\"><h3> Sprint: {} of {}</h3><a href=\"/prev_sprint\">&lt;</a> <a href=\"/next_sprint\">&gt;</a><p class=\"date\">Started: {}{} Tasks: {}</p></div>\n",
        header.sprint,
        header.num_sprints,
        escape(&header.sprint_date),
        NBSP.repeat(4),
        header.num_tasks
    ));
    html.push_str("</div>\n");

    html.push_str("<div class=\"tab_head\">");
    for (column, label) in [
        ("dev_sort", "DEVELOPER"),
        ("issue_sort", "ISSUE"),
        ("desc_sort", "DESCRIPTION"),
        ("status_sort", "STATUS"),
    ] {
        html.push_str(&format!("<a class=\"{0}\" href=\"/sort/{0}\">{1}</a> ", column, label));
    }
    html.push_str("</div>\n</div>\n");

    html.push_str(&format!(
        "<div class=\"mid_frame\" style=\"height: {}%\">\n<table class=\"scrum\">\n",
        header.middle_height
    ));
    for (i, row) in view.tasks.iter().enumerate() {
        html.push_str(&task_row(row, i));
    }
    html.push_str("</table>\n</div>\n");

    html.push_str(&format!(
        "<div class=\"bottom_frame\" style=\"height: {}%\">\n",
        header.blocker_height
    ));
    if view.blockers.is_empty() {
        html.push_str("<h4 class=\"blk_header\">Blockers: None</h4>\n");
    } else {
        html.push_str("<h4 class=\"blk_header\">Blockers:</h4>\n<ol class=\"blockers_list\">\n");
        for blocker in &view.blockers {
            html.push_str(&blocker_item(blocker));
        }
        html.push_str("</ol>\n");
    }
    html.push_str("</div>\n");

    html.push_str(concat!(
        "<form action=\"/task_add\" method=\"post\">Add tasks: ",
        "<input type=\"text\" maxlength=\"200\" name=\"issue_list\"> ",
        "<input type=\"submit\" value=\"Submit\"></form>\n",
        "<form action=\"/cli\" method=\"post\">CLI: ",
        "<input type=\"text\" maxlength=\"200\" name=\"cli_text\"> ",
        "<input type=\"submit\" value=\"Submit\"></form>\n",
    ));
    html.push_str("</body>\n</html>\n");
    html
}

fn post_button(action: &str, label: &str) -> String {
    format!(
        "<form action=\"{}\" method=\"post\" style=\"display:inline\"><input type=\"submit\" value=\"{}\"></form>\n",
        action, label
    )
}

/// Pixels between fieldsets of the update form, so few tasks fill the page.
pub fn interfield_spacing(tasks: usize) -> u32 {
    match tasks {
        2 => 30,
        3 => 20,
        4 => 10,
        5 => 5,
        _ => 0,
    }
}

/// A developer's update form for the active scrum.
pub fn dev_form_page(developer: &str, scrum: u32, tasks: &[DevTask]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Scrum {} update: {}</title>\n<style>body {{ font-family: monospace; }} fieldset {{ border: 1px solid #990000; margin-bottom: {}px; }}</style>\n",
        scrum,
        escape(developer),
        interfield_spacing(tasks.len())
    ));
    html.push_str("</head>\n<body>\n<a href=\"/\">Go back</a>\n");
    html.push_str("<form class=\"upform\" action=\"/update\" method=\"post\">\n");
    html.push_str(&format!(
        "<h3>Scrum Update Board for {}</h3>\n<h3 class=\"scrum\">Scrum {}</h3>\n",
        escape(developer),
        scrum
    ));
    html.push_str("<a href=\"/\">CANCEL</a> <input type=\"submit\" class=\"submit\" value=\"SEND\">\n");

    for task in tasks {
        let id = escape(task.task_id.as_str());
        html.push_str(&format!(
            "<fieldset>\n<legend><strong>{0}{1} </strong>{0}-{0}{0}{2}{0}</legend>\n",
            NBSP,
            task.issue,
            escape(&task.description)
        ));
        html.push_str(&format!(
            "{}Progress: <input type=\"number\" value=\"{}\" class=\"progress\" min=\"0\" max=\"100\" step=\"10\" name=\"progress_{}\">\n",
            NBSP, task.progress, id
        ));
        html.push_str(&format!(
            "Today: <input type=\"checkbox\" class=\"today\" name=\"today_{}\"{}>\n",
            id,
            if task.today { " checked" } else { "" }
        ));
        html.push_str(&format!(
            "Blocker: <input type=\"text\" class=\"blocker\" maxlength=\"100\" value=\"{}\" name=\"blocker_{}\">\n</fieldset>\n",
            escape(&task.blocker),
            id
        ));
    }
    html.push_str("</form>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{TaskDetails, TaskId};

    fn cell(progress: u8, previous: u8, blocker: &str) -> StatusCell {
        StatusCell::from_details(&TaskDetails {
            progress,
            previous,
            blocker: blocker.to_string(),
            today: false,
        })
    }

    // =========================================
    // Status markup
    // =========================================

    #[test]
    fn test_no_progress_markup() {
        assert_eq!(status_markup(&cell(0, 0, "")), "<mark class=\"dark\">[0]</mark>");
        assert_eq!(
            status_markup(&cell(0, 0, "db down")),
            "<mark class=\"dark\">[0]</mark><mark class=\"red\">Blocked</mark>"
        );
    }

    #[test]
    fn test_gain_markup() {
        // previous 20: 10 - 2 = 8 pads; gain 30: 15 - 2 = 13 pads
        let html = status_markup(&cell(50, 20, ""));
        assert_eq!(
            html,
            format!(
                "<mark class=\"medium\">{}20</mark><mark class=\"light\">{}30</mark><mark class=\"dark\">[50]</mark>",
                NBSP.repeat(8),
                NBSP.repeat(13)
            )
        );
    }

    #[test]
    fn test_gain_from_zero_has_no_base() {
        let html = status_markup(&cell(10, 0, ""));
        assert!(!html.contains("medium"));
        assert!(html.ends_with("<mark class=\"dark\">[10]</mark>"));
    }

    #[test]
    fn test_steady_markup() {
        let html = status_markup(&cell(0, 40, ""));
        assert_eq!(
            html,
            format!(
                "<mark class=\"medium\">{}40</mark><mark class=\"dark\">[40]</mark>",
                NBSP.repeat(18)
            )
        );
    }

    #[test]
    fn test_regression_markup() {
        // gain -30: 15 - 3 - 1 = 11 dashes
        let html = status_markup(&cell(40, 70, "blocked on review"));
        assert_eq!(
            html,
            format!(
                "<mark class=\"medium\">{}40</mark><mark class=\"dark\">[40]</mark><mark class=\"orange\">&lt;{}-30&nbsp;</mark><mark class=\"red\">Blocked</mark>",
                NBSP.repeat(18),
                "-".repeat(11)
            )
        );
    }

    // =========================================
    // Pages
    // =========================================

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href='x'>&\""), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;");
    }

    #[test]
    fn test_interfield_spacing() {
        assert_eq!(interfield_spacing(1), 0);
        assert_eq!(interfield_spacing(2), 30);
        assert_eq!(interfield_spacing(3), 20);
        assert_eq!(interfield_spacing(4), 10);
        assert_eq!(interfield_spacing(5), 5);
        assert_eq!(interfield_spacing(9), 0);
    }

    #[test]
    fn test_dev_form_fields() {
        let tasks = vec![
            DevTask {
                task_id: TaskId::new("bob", 55),
                issue: 55,
                description: "Search <page>".into(),
                progress: 40,
                today: true,
                blocker: "API".into(),
            },
            DevTask {
                task_id: TaskId::new("bob", 56),
                issue: 56,
                description: "Login".into(),
                progress: 0,
                today: false,
                blocker: String::new(),
            },
        ];
        let html = dev_form_page("Bob", 3, &tasks);
        assert!(html.contains("name=\"progress_bob:55\""));
        assert!(html.contains("value=\"40\""));
        assert!(html.contains("name=\"today_bob:55\" checked"));
        assert!(html.contains("name=\"today_bob:56\">"));
        assert!(html.contains("Search &lt;page&gt;"));
        assert!(html.contains("margin-bottom: 30px"));
        assert!(html.contains("Scrum 3"));
    }
}
