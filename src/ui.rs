use crate::models::{DisplayState, ResolvedSchedule, ResolvedTask};

pub fn render_dashboard(user_id: u64, schedule: &ResolvedSchedule) -> String {
    DASHBOARD_HTML
        .replace("{{USER_ID}}", &user_id.to_string())
        .replace("{{DAY_TYPE}}", schedule.day_type.label())
        .replace("{{RESOLVED_AT}}", &schedule.resolved_at.format("%Y-%m-%d %H:%M").to_string())
        .replace("{{CURRENT}}", &render_task_card("Current task", schedule.current.as_ref()))
        .replace("{{NEXT}}", &render_task_card("Next task", schedule.next.as_ref()))
}

fn render_task_card(title: &str, task: Option<&ResolvedTask>) -> String {
    let Some(task) = task else {
        return format!(
            r#"<article class="task"><span class="label">{title}</span><p class="empty">Nothing left for today.</p></article>"#
        );
    };

    format!(
        r#"<article class="task {class}" data-task-id="{id}">
        <span class="label">{title}</span>
        <span class="time">{time}</span>
        <span class="name">{name}</span>
        <span class="routine">{routine} &middot; {routine_type}</span>
        <div class="buttons">
          <button class="btn-done" type="button" data-status="completed">Done</button>
          <button class="btn-skip" type="button" data-status="skipped">Skip</button>
        </div>
      </article>"#,
        class = state_class(task.state),
        id = task.task.id,
        time = escape_html(&task.task.time),
        name = escape_html(&task.task.name),
        routine = escape_html(&task.routine_name),
        routine_type = task.routine_type.label(),
    )
}

fn state_class(state: DisplayState) -> &'static str {
    match state {
        DisplayState::Normal => "",
        DisplayState::Upcoming => "task-upcoming",
        DisplayState::Overdue => "task-overdue",
    }
}

fn escape_html(value: &str) -> String {
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

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Routine Tracker</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --upcoming: #f2b705;
      --overdue: #c63b2b;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle {
      margin: 6px 0 0;
      color: #5f5c57;
    }

    .tasks {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(240px, 1fr));
      gap: 16px;
    }

    .task {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 2px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 6px;
    }

    .task.task-upcoming {
      border-color: var(--upcoming);
    }

    .task.task-overdue {
      border-color: var(--overdue);
    }

    .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .time {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .task-overdue .time {
      color: var(--overdue);
    }

    .name {
      font-size: 1.2rem;
    }

    .routine, .empty {
      color: #6f6a65;
    }

    .buttons {
      display: flex;
      gap: 8px;
      margin-top: 8px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      color: white;
    }

    .btn-done {
      background: var(--accent);
    }

    .btn-skip {
      background: var(--accent-2);
    }

    .status[data-type="error"] {
      color: var(--overdue);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Today</h1>
      <p class="subtitle">{{DAY_TYPE}} schedule, resolved at <span id="resolved-at">{{RESOLVED_AT}}</span></p>
    </header>

    <section class="tasks" id="tasks">
      {{CURRENT}}
      {{NEXT}}
    </section>

    <div class="status" id="status"></div>
  </main>

  <script>
    const userId = {{USER_ID}};
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const attachButtons = () => {
      document.querySelectorAll('.task[data-task-id] button').forEach((button) => {
        button.addEventListener('click', async () => {
          const taskId = button.closest('.task').dataset.taskId;
          try {
            const response = await fetch(`/tasks/${taskId}/complete?status=${button.dataset.status}`, {
              method: 'POST'
            });
            if (!response.ok) {
              throw new Error(await response.text());
            }
            window.location.reload();
          } catch (err) {
            setStatus(`Could not update task: ${err.message}`, 'error');
          }
        });
      });
    };

    const refresh = async () => {
      try {
        const response = await fetch(`/users/${userId}/schedule`);
        if (!response.ok) {
          throw new Error(await response.text());
        }
        const schedule = await response.json();
        const shown = Array.from(document.querySelectorAll('.task[data-task-id]')).map((el) => Number(el.dataset.taskId));
        const fresh = [schedule.current, schedule.next].filter(Boolean).map((task) => task.id);
        const overdueChanged = schedule.current && schedule.current.state === 'overdue'
          && !document.querySelector('.task-overdue');
        if (overdueChanged || shown.join(',') !== fresh.join(',')) {
          window.location.reload();
        }
      } catch (err) {
        setStatus(`Could not refresh schedule: ${err.message}`, 'error');
      }
    };

    attachButtons();
    setInterval(refresh, 60000);
  </script>
</body>
</html>
"#;
