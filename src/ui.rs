use crate::models::{DayCard, GridResponse, Mood};
use crate::ticker::{DayView, HeaderView};
use std::fmt::Write;

pub struct PageView<'a> {
    pub header: &'a HeaderView,
    pub day: &'a DayView,
    pub grid: &'a GridResponse,
    pub card: &'a DayCard,
}

pub fn render_index(view: &PageView<'_>) -> String {
    INDEX_HTML
        .replace("{{TITLE}}", &escape_html(&view.header.title))
        .replace("{{SUBTITLE}}", &escape_html(&view.header.subtitle))
        .replace("{{PERCENT}}", &format!("{:.2}", view.day.percent))
        .replace("{{COUNTDOWN}}", &view.day.countdown)
        .replace("{{DOTS}}", &render_dots(view.grid))
        .replace("{{CARD_DATE}}", &view.card.date)
        .replace("{{CARD_LABEL}}", &escape_html(&view.card.label))
        .replace("{{MOODS}}", &render_moods(view.card.mood))
        .replace("{{REFLECTION}}", &escape_html(&view.card.reflection))
}

fn render_dots(grid: &GridResponse) -> String {
    let mut html = String::with_capacity(grid.dots.len() * 64);
    for dot in &grid.dots {
        let mut class = String::from("dot");
        if dot.past {
            class.push_str(" past");
        }
        if let Some(mood) = dot.mood {
            let _ = write!(class, " mood-{mood}");
        }
        let _ = write!(
            html,
            r#"<div class="{class}" data-date="{date}" title="{date}"></div>"#,
            date = dot.date
        );
    }
    html
}

fn render_moods(selected: Mood) -> String {
    let mut html = String::new();
    for mood in Mood::ALL {
        let checked = if mood == selected { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<label class="mood mood-{mood}"><input type="radio" name="mood" value="{mood}"{checked} /> {mood}</label>"#
        );
    }
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

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Year Dots</title>
  <style>
    :root {
      --bg: #101114;
      --ink: #f1efe9;
      --muted: #8c8a85;
      --dot: #2b2d33;
      --past: #f1efe9;
      --fulfilling: #7bd389;
      --calm: #79a7e3;
      --down: #e3797f;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      display: grid;
      gap: 24px;
    }

    h1 {
      font-size: clamp(1.1rem, 3vw, 1.5rem);
      margin: 0;
      font-weight: 500;
    }

    .subtitle {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(14px, 1fr));
      gap: 6px;
    }

    .dot {
      width: 12px;
      height: 12px;
      border-radius: 50%;
      background: var(--dot);
    }

    .dot.past {
      background: var(--past);
    }

    .dot.mood-fulfilling {
      background: var(--fulfilling);
    }

    .dot.mood-calm {
      background: var(--calm);
    }

    .dot.mood-down {
      background: var(--down);
    }

    .day-progress {
      display: grid;
      gap: 8px;
    }

    .bar {
      height: 8px;
      border-radius: 999px;
      background: var(--dot);
      overflow: hidden;
    }

    .bar-fill {
      height: 100%;
      background: var(--past);
    }

    .countdown {
      font-variant-numeric: tabular-nums;
      font-size: 1.4rem;
    }

    .card {
      border: 1px solid var(--dot);
      border-radius: 18px;
      padding: 20px;
      display: grid;
      gap: 14px;
      touch-action: pan-y;
    }

    .card-nav {
      display: flex;
      justify-content: space-between;
      align-items: center;
      gap: 12px;
    }

    .card-nav button,
    .session button {
      background: none;
      color: var(--ink);
      border: 1px solid var(--muted);
      border-radius: 10px;
      padding: 6px 12px;
      cursor: pointer;
    }

    .card-nav button:disabled {
      opacity: 0.3;
      cursor: default;
    }

    .moods {
      display: flex;
      gap: 12px;
      flex-wrap: wrap;
    }

    textarea {
      width: 100%;
      min-height: 96px;
      background: transparent;
      color: var(--ink);
      border: 1px solid var(--dot);
      border-radius: 12px;
      padding: 10px;
      font: inherit;
    }

    .status {
      min-height: 1.2em;
      color: var(--muted);
      font-size: 0.9rem;
    }

    .session {
      display: flex;
      gap: 8px;
      align-items: center;
      flex-wrap: wrap;
    }

    .session input {
      background: transparent;
      color: var(--ink);
      border: 1px solid var(--dot);
      border-radius: 10px;
      padding: 6px 10px;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1 id="title">{{TITLE}}</h1>
      <p id="subtitle" class="subtitle">{{SUBTITLE}}</p>
    </header>

    <section id="grid" class="grid">{{DOTS}}</section>

    <section class="day-progress">
      <div class="bar"><div id="bar-fill" class="bar-fill" style="width: {{PERCENT}}%"></div></div>
      <span id="countdown" class="countdown">{{COUNTDOWN}}</span>
    </section>

    <section id="card" class="card" data-date="{{CARD_DATE}}">
      <div class="card-nav">
        <button id="prev" type="button" aria-label="Previous day">&larr;</button>
        <strong id="card-label">{{CARD_LABEL}}</strong>
        <button id="next" type="button" aria-label="Next day">&rarr;</button>
      </div>
      <div id="moods" class="moods">{{MOODS}}</div>
      <textarea id="reflection" placeholder="How did today go?">{{REFLECTION}}</textarea>
      <div id="status" class="status"></div>
    </section>

    <section id="session" class="session"></section>
  </main>

  <script>
    const titleEl = document.getElementById('title');
    const subtitleEl = document.getElementById('subtitle');
    const gridEl = document.getElementById('grid');
    const barEl = document.getElementById('bar-fill');
    const countdownEl = document.getElementById('countdown');
    const cardEl = document.getElementById('card');
    const labelEl = document.getElementById('card-label');
    const prevBtn = document.getElementById('prev');
    const nextBtn = document.getElementById('next');
    const reflectionEl = document.getElementById('reflection');
    const statusEl = document.getElementById('status');
    const sessionEl = document.getElementById('session');

    let gridRevision = null;
    let gridFilled = null;

    const post = async (url, body) => {
      const res = await fetch(url, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body || {})
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      return res.json();
    };

    const renderCard = (card) => {
      cardEl.dataset.date = card.date;
      labelEl.textContent = card.label;
      prevBtn.disabled = !card.has_previous;
      nextBtn.disabled = !card.has_next;
      document.querySelectorAll('input[name="mood"]').forEach((input) => {
        input.checked = input.value === card.mood;
      });
      if (document.activeElement !== reflectionEl) {
        reflectionEl.value = card.reflection;
      }
      statusEl.textContent = card.status || '';
    };

    const renderGrid = (grid) => {
      if (grid.revision === gridRevision && grid.filled_dots === gridFilled) {
        return;
      }
      gridRevision = grid.revision;
      gridFilled = grid.filled_dots;
      const dots = gridEl.children;
      grid.dots.forEach((dot) => {
        const el = dots[dot.index];
        if (!el) {
          return;
        }
        el.className = 'dot';
        el.classList.toggle('past', dot.past);
        if (dot.mood) {
          el.classList.add(`mood-${dot.mood}`);
        }
      });
    };

    const tick = async () => {
      const res = await fetch('/api/progress');
      if (!res.ok) {
        return;
      }
      const progress = await res.json();
      titleEl.textContent = progress.header.title;
      subtitleEl.textContent = progress.header.subtitle;
      barEl.style.width = `${progress.day.percent}%`;
      countdownEl.textContent = progress.day.countdown;
    };

    const refreshGrid = async () => {
      const res = await fetch('/api/grid');
      if (res.ok) {
        renderGrid(await res.json());
      }
    };

    const refreshCard = async () => {
      const res = await fetch('/api/card');
      if (res.ok) {
        renderCard(await res.json());
      }
    };

    const renderSession = (session) => {
      sessionEl.innerHTML = '';
      if (session.signed_in) {
        const who = document.createElement('span');
        who.textContent = `Signed in as ${session.user_id}`;
        const out = document.createElement('button');
        out.type = 'button';
        out.textContent = 'Sign out';
        out.addEventListener('click', () => {
          post('/api/auth/sign-out').then(renderSession).then(reloadAll).catch(showError);
        });
        sessionEl.append(who, out);
        return;
      }
      if (session.login_url) {
        const link = document.createElement('button');
        link.type = 'button';
        link.textContent = 'Sign in';
        link.addEventListener('click', () => {
          window.location.href = '/auth/login';
        });
        sessionEl.append(link);
        return;
      }
      const input = document.createElement('input');
      input.placeholder = 'Your name';
      const go = document.createElement('button');
      go.type = 'button';
      go.textContent = 'Sign in';
      go.addEventListener('click', () => {
        post('/api/auth/sign-in', { token: input.value })
          .then(renderSession)
          .then(reloadAll)
          .catch(showError);
      });
      sessionEl.append(input, go);
    };

    const showError = (err) => {
      statusEl.textContent = err.message;
    };

    const reloadAll = () => {
      setTimeout(() => {
        refreshCard().catch(showError);
        refreshGrid().catch(showError);
      }, 300);
    };

    const loadSession = async () => {
      const hash = new URLSearchParams(window.location.hash.slice(1));
      const token = hash.get('access_token');
      if (token) {
        history.replaceState(null, '', window.location.pathname);
        renderSession(await post('/api/auth/sign-in', { token }));
        reloadAll();
        return;
      }
      const res = await fetch('/api/session');
      if (res.ok) {
        renderSession(await res.json());
      }
    };

    prevBtn.addEventListener('click', () => {
      post('/api/card/shift', { delta: -1 }).then(renderCard).catch(showError);
    });

    nextBtn.addEventListener('click', () => {
      post('/api/card/shift', { delta: 1 }).then(renderCard).catch(showError);
    });

    document.getElementById('moods').addEventListener('change', (event) => {
      post('/api/card/mood', { mood: event.target.value }).then(renderCard).catch(showError);
    });

    reflectionEl.addEventListener('input', () => {
      post('/api/card/reflection', { reflection: reflectionEl.value }).catch(showError);
    });

    let touchOrigin = null;
    let touchPoints = [];

    cardEl.addEventListener('touchstart', (event) => {
      const touch = event.touches[0];
      touchOrigin = { x: touch.clientX, y: touch.clientY };
      touchPoints = [];
    }, { passive: true });

    cardEl.addEventListener('touchmove', (event) => {
      if (!touchOrigin) {
        return;
      }
      const touch = event.touches[0];
      touchPoints.push({ dx: touch.clientX - touchOrigin.x, dy: touch.clientY - touchOrigin.y });
    }, { passive: true });

    cardEl.addEventListener('touchend', (event) => {
      if (!touchOrigin) {
        return;
      }
      const touch = event.changedTouches[0];
      touchPoints.push({ dx: touch.clientX - touchOrigin.x, dy: touch.clientY - touchOrigin.y });
      touchOrigin = null;
      post('/api/card/swipe', { points: touchPoints }).then(renderCard).catch(showError);
    });

    setInterval(() => tick().catch(() => {}), 1000);
    setInterval(() => refreshGrid().catch(() => {}), 1000);
    setInterval(() => refreshCard().catch(() => {}), 1000);
    loadSession().catch(showError);
    refreshCard().catch(showError);
  </script>
</body>
</html>
"#;
