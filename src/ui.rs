use crate::locale::{Locale, day_label, month_name, short_month_name, t, t_with};
use crate::models::{AuthUser, DayCell, Habit, MonthGrid, TodaySummary, YearGrid};
use crate::theme::habit_color_with_opacity;
use crate::days::parse_date_key;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TEXT_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{t:([A-Za-z0-9_.]+)\}\}").expect("text key pattern compiles"));

/// The page is rendered in the signed-in user's language, English otherwise.
pub fn render_index(
    summary: &TodaySummary,
    habits: &[Habit],
    user: Option<&AuthUser>,
    error: Option<&str>,
) -> String {
    let locale = Locale::for_user(user);
    let who = match user {
        Some(user) => escape_html(&user.display_name()),
        None => escape_html(t(locale, "auth.guest")),
    };
    let banner = error
        .map(|message| {
            format!(
                r#"<div class="banner" role="alert"><span>{}</span><button type="button" class="dismiss" aria-label="Dismiss">×</button></div>"#,
                escape_html(message)
            )
        })
        .unwrap_or_default();
    let progress = if summary.total == 0 {
        t(locale, "today.nothingScheduled").to_string()
    } else if summary.remaining == 0 {
        t_with(locale, "today.allDone", &[("n", summary.total.to_string())])
    } else {
        t_with(
            locale,
            "today.progress",
            &[
                ("done", summary.completed.to_string()),
                ("total", summary.total.to_string()),
                ("remaining", summary.remaining.to_string()),
                ("rate", summary.completion_rate.to_string()),
            ],
        )
    };

    let today_items: String = summary
        .habits
        .iter()
        .map(|habit| {
            format!(
                r#"<li><span class="dot" style="background:{color}"></span><span class="name">{name}</span><span class="time">{time}</span><button type="button" class="check{done}" data-habit="{id}" data-completed="{completed}">{label}</button></li>"#,
                color = escape_html(&habit.color),
                name = escape_html(&habit.name),
                time = escape_html(&habit.time),
                id = escape_html(&habit.id),
                done = if habit.completed { " done" } else { "" },
                completed = habit.completed,
                label = escape_html(t(
                    locale,
                    if habit.completed { "today.done" } else { "today.markDone" }
                )),
            )
        })
        .collect();

    let habit_options: String = habits
        .iter()
        .map(|habit| {
            format!(
                r#"<option value="{}">{}</option>"#,
                escape_html(&habit.id),
                escape_html(&habit.name)
            )
        })
        .collect();

    let day_toggles: String = (0..7)
        .map(|day| {
            let checked = if day < 5 { " checked" } else { "" };
            format!(
                r#"<label class="day"><input type="checkbox" name="days" value="{day}"{checked} />{}</label>"#,
                day_label(locale, day)
            )
        })
        .collect();

    localize(INDEX_HTML, locale)
        .replace("{{LANG}}", locale.tag())
        .replace("{{USER}}", &who)
        .replace("{{BANNER}}", &banner)
        .replace("{{DATE_LABEL}}", &escape_html(&pretty_date(&summary.date, locale)))
        .replace("{{DATE}}", &summary.date)
        .replace("{{PROGRESS}}", &escape_html(&progress))
        .replace("{{TODAY_ITEMS}}", &today_items)
        .replace("{{HABIT_OPTIONS}}", &habit_options)
        .replace("{{DAY_TOGGLES}}", &day_toggles)
}

/// Replaces every `{{t:key}}` marker with the escaped text for `key`.
fn localize(template: &str, locale: Locale) -> String {
    TEXT_KEY
        .replace_all(template, |caps: &Captures| escape_html(t(locale, &caps[1])))
        .into_owned()
}

/// Month calendar fragment. Tappable cells carry their date and state.
pub fn render_month_grid(grid: &MonthGrid, color: &str, today: NaiveDate, locale: Locale) -> String {
    let mut html = format!(
        r#"<div class="month" data-year="{}" data-month="{}"><div class="month-head"><button type="button" class="nav" data-shift="-1">‹</button><h3>{} {}</h3><button type="button" class="nav" data-shift="1">›</button></div><div class="grid">"#,
        grid.year,
        grid.month,
        escape_html(month_name(locale, grid.month)),
        grid.year
    );
    for day in 0..7 {
        html.push_str(&format!(r#"<div class="head">{}</div>"#, day_label(locale, day)));
    }
    for cell in grid.weeks.iter().flatten() {
        html.push_str(&month_cell(cell, color, today));
    }
    let summary = t_with(
        locale,
        "calendar.summary",
        &[
            ("done", grid.completed_days.to_string()),
            ("total", grid.scheduled_days.to_string()),
        ],
    );
    html.push_str(&format!(
        r#"</div><p class="hint">{}</p></div>"#,
        escape_html(&summary)
    ));
    html
}

fn month_cell(cell: &DayCell, color: &str, today: NaiveDate) -> String {
    let mut classes = vec!["cell"];
    if !cell.in_current_month {
        classes.push("outside");
    }
    if cell.is_today {
        classes.push("today");
    }
    let tappable = cell.is_tappable(today);
    if tappable {
        classes.push("tap");
    }
    let style = if cell.is_scheduled && cell.is_completed {
        format!(
            "background:{};color:{}",
            habit_color_with_opacity(color, 0.35),
            escape_html(color)
        )
    } else if cell.is_today {
        format!("outline-color:{}", escape_html(color))
    } else {
        String::new()
    };
    format!(
        r#"<div class="{}" style="{}" data-date="{}" data-completed="{}">{}</div>"#,
        classes.join(" "),
        style,
        cell.date,
        cell.is_completed,
        cell.day_of_month
    )
}

/// Twelve small month blocks; padding cells stay blank.
pub fn render_year_heatmap(grid: &YearGrid, color: &str, locale: Locale) -> String {
    let mut html = format!(r#"<div class="year"><h3>{}</h3><div class="months">"#, grid.year);
    for month in &grid.months {
        html.push_str(&format!(
            r#"<div class="mini"><div class="mini-title">{} <small>{}/{}</small></div><div class="mini-grid">"#,
            escape_html(short_month_name(locale, month.month)),
            month.completed_days,
            month.scheduled_days
        ));
        for cell in month.weeks.iter().flatten() {
            if !cell.in_current_month {
                html.push_str(r#"<span class="blank"></span>"#);
                continue;
            }
            let (fill, title_key) = match (cell.is_scheduled, cell.is_completed) {
                (true, true) => (escape_html(color), "heatmap.completed"),
                (true, false) => (habit_color_with_opacity(color, 0.15), "heatmap.missed"),
                (false, _) => ("rgba(255,255,255,0.03)".to_string(), "heatmap.notScheduled"),
            };
            let ring = if cell.is_today { " today" } else { "" };
            html.push_str(&format!(
                r#"<span class="sq{ring}" style="background:{fill}" title="{}: {}"></span>"#,
                cell.date,
                escape_html(t(locale, title_key))
            ));
        }
        html.push_str("</div></div>");
    }
    html.push_str("</div></div>");
    html
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
            other => escaped.push(other),
        }
    }
    escaped
}

/// `YYYY-MM-DD` to a short label such as "Sat, Oct 17", falling back to the raw key.
pub fn pretty_date(key: &str, locale: Locale) -> String {
    match parse_date_key(key) {
        Some(date) => format!(
            "{}, {} {}",
            day_label(locale, date.weekday().num_days_from_monday() as usize),
            short_month_name(locale, date.month()),
            date.day()
        ),
        None => key.to_string(),
    }
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="{{LANG}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habits</title>
  <script src="https://telegram.org/js/telegram-web-app.js"></script>
  <style>
    :root {
      --background: #0b0b10;
      --foreground: #e5e7eb;
      --muted-foreground: #9aa4b2;
      --primary: #8b5cf6;
      --primary-foreground: #ffffff;
      --card: #111827;
      --secondary: #111827;
      --header: #0f172a;
      --link: #a78bfa;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--background);
      color: var(--foreground);
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
      padding: 16px;
    }

    header { display: flex; justify-content: space-between; align-items: baseline; }
    header small { color: var(--muted-foreground); }

    section {
      background: var(--card);
      border-radius: 16px;
      padding: 16px;
      margin-top: 16px;
    }

    .banner {
      display: flex;
      justify-content: space-between;
      gap: 12px;
      background: #7f1d1d;
      color: #fee2e2;
      border-radius: 12px;
      padding: 10px 14px;
      margin-top: 12px;
    }
    .banner .dismiss { background: none; border: 0; color: inherit; font-size: 18px; }

    ul.today { list-style: none; padding: 0; margin: 0; display: grid; gap: 8px; }
    ul.today li { display: flex; align-items: center; gap: 10px; }
    .dot { width: 10px; height: 10px; border-radius: 50%; }
    .name { flex: 1; }
    .time { color: var(--muted-foreground); font-size: 13px; }

    button.check, form button {
      border: 0;
      border-radius: 10px;
      padding: 6px 12px;
      background: var(--primary);
      color: var(--primary-foreground);
    }
    button.check.done { opacity: 0.6; }
    button:disabled { opacity: 0.4; }

    .month-head { display: flex; justify-content: space-between; align-items: center; }
    .nav { background: none; border: 0; color: var(--muted-foreground); font-size: 22px; }
    .grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 4px; text-align: center; }
    .head { font-size: 12px; color: var(--muted-foreground); }
    .cell { padding: 8px 0; border-radius: 8px; font-size: 14px; }
    .cell.outside { opacity: 0.3; }
    .cell.today { outline: 1px solid; }
    .cell.tap { cursor: pointer; }
    .cell.busy { opacity: 0.5; pointer-events: none; }
    .hint { color: var(--muted-foreground); font-size: 13px; }

    .stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 8px; text-align: center; }
    .stats strong { display: block; font-size: 22px; }
    .bars { display: grid; grid-template-columns: repeat(7, 1fr); gap: 6px; align-items: end; height: 80px; margin-top: 12px; }
    .bar { background: var(--primary); border-radius: 4px 4px 0 0; min-height: 2px; }

    .months { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; }
    .mini-title { font-size: 12px; color: var(--muted-foreground); }
    .mini-grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 1px; }
    .sq, .blank { aspect-ratio: 1; border-radius: 2px; }
    .sq.today { outline: 1px solid rgba(255, 255, 255, 0.5); }

    form { display: grid; gap: 10px; }
    form input[type=text], form input[type=time], select {
      background: var(--secondary);
      color: var(--foreground);
      border: 1px solid #334155;
      border-radius: 10px;
      padding: 8px;
    }
    .days { display: flex; flex-wrap: wrap; gap: 6px; }
    .day { font-size: 13px; }
  </style>
</head>
<body>
  <header>
    <h2>{{t:today.title}}</h2>
    <small id="who">{{USER}}</small>
  </header>
  <div id="banner-slot">{{BANNER}}</div>

  <section>
    <p><strong>{{DATE_LABEL}}</strong> · <span id="progress">{{PROGRESS}}</span></p>
    <ul class="today">{{TODAY_ITEMS}}</ul>
  </section>

  <section>
    <select id="habit-picker">{{HABIT_OPTIONS}}</select>
    <div id="stats"></div>
    <div id="calendar"></div>
    <div id="year"></div>
  </section>

  <section>
    <h3>{{t:habits.new}}</h3>
    <form id="new-habit">
      <input type="text" name="name" maxlength="255" placeholder="{{t:habits.namePlaceholder}}" required />
      <div class="days">{{DAY_TOGGLES}}</div>
      <input type="time" name="time" value="09:00" step="60" />
      <input type="hidden" name="color" value="#8b5cf6" />
      <button type="submit">{{t:habits.addLabel}}</button>
    </form>
  </section>

  <script>
    const tg = window.Telegram && window.Telegram.WebApp;
    const picker = document.getElementById('habit-picker');
    const bannerSlot = document.getElementById('banner-slot');
    let view = null;

    const showError = (message) => {
      bannerSlot.innerHTML = '';
      const banner = document.createElement('div');
      banner.className = 'banner';
      banner.setAttribute('role', 'alert');
      const text = document.createElement('span');
      text.textContent = message;
      const close = document.createElement('button');
      close.className = 'dismiss';
      close.textContent = '×';
      banner.append(text, close);
      bannerSlot.append(banner);
    };

    bannerSlot.addEventListener('click', (event) => {
      if (event.target.classList.contains('dismiss')) bannerSlot.innerHTML = '';
    });

    const call = async (url, options = {}) => {
      const res = await fetch(url, {
        headers: { 'content-type': 'application/json' },
        ...options
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || '{{t:error.requestFailed}}');
      }
      return res.status === 204 ? null : res;
    };

    const applyTheme = async () => {
      if (!tg) return;
      const res = await call('/api/theme', {
        method: 'POST',
        body: JSON.stringify({ color_scheme: tg.colorScheme, theme_params: tg.themeParams || {} })
      });
      const theme = await res.json();
      for (const [name, value] of Object.entries(theme.variables)) {
        document.documentElement.style.setProperty(name, value);
      }
    };

    const signIn = async () => {
      if (!tg || !tg.initData) return;
      const auth = await (await call('/api/auth')).json();
      if (auth.is_authenticated) return;
      await call('/auth/telegram', {
        method: 'POST',
        body: JSON.stringify({ initData: tg.initData, initDataUnsafe: tg.initDataUnsafe || {} })
      });
      window.location.reload();
    };

    const loadFragment = async (target, url) => {
      const res = await call(url);
      document.getElementById(target).innerHTML = await res.text();
    };

    const renderStats = (stats) => {
      const max = Math.max(1, ...stats.weekly_buckets.map((b) => b.total));
      const bars = stats.weekly_buckets
        .map((b) => `<div class="bar" title="${b.label}: ${b.completed}/${b.total}" style="height:${(b.completed / max) * 100}%"></div>`)
        .join('');
      document.getElementById('stats').innerHTML = `
        <div class="stats">
          <div><strong>${stats.current_streak}</strong>{{t:detail.currentStreak}}</div>
          <div><strong>${stats.longest_streak}</strong>{{t:detail.longestStreak}}</div>
          <div><strong>${stats.completion_rate_last_30}%</strong>{{t:detail.last30}}</div>
        </div>
        <div class="bars">${bars}</div>`;
    };

    const showHabit = async () => {
      const id = picker.value;
      if (!id) return;
      view = view && view.id === id ? view : { id, year: null, month: null };
      const query = view.year ? `?year=${view.year}&month=${view.month}` : '';
      const stats = await (await call(`/api/habits/${id}/stats`)).json();
      renderStats(stats);
      await loadFragment('calendar', `/fragments/habits/${id}/calendar${query}`);
      await loadFragment('year', `/fragments/habits/${id}/year`);
    };

    document.getElementById('calendar').addEventListener('click', (event) => {
      const target = event.target;
      const month = target.closest('.month');
      if (target.classList.contains('nav') && month) {
        const index = Number(month.dataset.year) * 12 + Number(month.dataset.month) - 1 + Number(target.dataset.shift);
        view.year = Math.floor(index / 12);
        view.month = (index % 12) + 1;
        showHabit().catch((err) => showError(err.message));
        return;
      }
      if (!target.classList.contains('tap')) return;
      const completed = target.dataset.completed !== 'true';
      target.classList.add('busy');
      call(`/api/habits/${view.id}/toggle`, {
        method: 'POST',
        body: JSON.stringify({ date: target.dataset.date, completed })
      })
        .then(showHabit)
        .catch((err) => {
          showError(err.message);
          return showHabit();
        });
    });

    document.querySelectorAll('button.check').forEach((button) => {
      button.addEventListener('click', () => {
        button.disabled = true;
        const completed = button.dataset.completed !== 'true';
        call(`/api/habits/${button.dataset.habit}/toggle`, {
          method: 'POST',
          body: JSON.stringify({ date: '{{DATE}}', completed })
        })
          .then(() => window.location.reload())
          .catch((err) => {
            button.disabled = false;
            showError(err.message);
          });
      });
    });

    document.getElementById('new-habit').addEventListener('submit', (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const input = {
        name: form.get('name'),
        days: form.getAll('days').map(Number),
        time: form.get('time'),
        color: form.get('color')
      };
      call('/api/habits', { method: 'POST', body: JSON.stringify(input) })
        .then(() => window.location.reload())
        .catch((err) => showError(err.message));
    });

    picker.addEventListener('change', () => showHabit().catch((err) => showError(err.message)));

    if (tg) {
      tg.ready();
      if (tg.expand) tg.expand();
      if (tg.onEvent) tg.onEvent('themeChanged', () => applyTheme().catch(() => {}));
    }
    applyTheme().catch(() => {});
    signIn().catch((err) => showError(err.message));
    showHabit().catch((err) => showError(err.message));
  </script>
</body>
</html>
"##;
