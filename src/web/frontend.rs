//! Embedded HTML/CSS/JS frontend for the aihub dashboard.
//!
//! The whole page is compiled into the binary as a string constant. It
//! holds no workflow state of its own: every action posts to the JSON API
//! and re-renders from the returned session.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>AI Hub · Complaint Classifier</title>
<style>
:root {
  --bg: #0b1020;
  --surface: #131a2e;
  --border: #263151;
  --text: #e5e9f5;
  --muted: #8a94b3;
  --accent: #6366f1;
  --complaint: #ef4444;
  --other: #22c55e;
  --warn: #f59e0b;
  --radius: 10px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font: 14px/1.5 var(--font); }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }

header {
  display: flex; align-items: center; justify-content: space-between;
  margin-bottom: 20px; padding-bottom: 16px; border-bottom: 1px solid var(--border);
}
header h1 { font-size: 22px; font-weight: 600; }
header h1 span { color: var(--accent); }
header .subtitle { color: var(--muted); font-size: 13px; }
.badges { display: flex; gap: 8px; align-items: center; }
.badge {
  padding: 4px 10px; border-radius: 12px; font-size: 12px;
  border: 1px solid var(--border); background: var(--surface);
}
.badge.ok { border-color: var(--other); color: var(--other); }
.badge.warn { border-color: var(--warn); color: var(--warn); }
.badge.err { border-color: var(--complaint); color: var(--complaint); }

nav { display: flex; gap: 4px; margin-bottom: 20px; }
nav button {
  padding: 8px 18px; border: 1px solid var(--border); border-radius: 8px;
  background: var(--surface); color: var(--muted); cursor: pointer; font-size: 13px;
}
nav button.active { background: var(--accent); border-color: var(--accent); color: #fff; }
.panel { display: none; }
.panel.active { display: block; }

.card {
  background: var(--surface); border: 1px solid var(--border);
  border-radius: var(--radius); padding: 20px; margin-bottom: 16px;
}
.card h2 { font-size: 16px; margin-bottom: 14px; }
.card h2 small { color: var(--muted); font-weight: 400; font-size: 12px; margin-left: 8px; }

.dropzone {
  border: 2px dashed var(--border); border-radius: var(--radius);
  padding: 36px; text-align: center; color: var(--muted); cursor: pointer;
}
.dropzone.over { border-color: var(--accent); color: var(--text); }
.dropzone strong { color: var(--text); }

.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(170px, 1fr)); gap: 12px; margin-bottom: 16px; }
.stat { background: var(--bg); border: 1px solid var(--border); border-radius: 8px; padding: 14px; text-align: center; }
.stat .value { font: 700 26px var(--mono); color: var(--accent); }
.stat .value.complaint { color: var(--complaint); }
.stat .value.other { color: var(--other); }
.stat .label { font-size: 11px; color: var(--muted); text-transform: uppercase; letter-spacing: .5px; }

.table-wrap { overflow-x: auto; }
table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 7px 10px; border-bottom: 1px solid var(--border); white-space: nowrap; }
td { max-width: 260px; overflow: hidden; text-overflow: ellipsis; }
th { color: var(--muted); font-weight: 500; font-size: 11px; text-transform: uppercase; }
th.sel, td.sel { background: rgba(99,102,241,.12); }
td.num, th.num { text-align: right; font-family: var(--mono); }

.row { display: flex; gap: 10px; align-items: center; flex-wrap: wrap; }
select {
  background: var(--bg); border: 1px solid var(--border); border-radius: 6px;
  color: var(--text); padding: 7px 10px; font-size: 13px; min-width: 220px;
}
.btn {
  padding: 8px 16px; border: 1px solid var(--border); border-radius: 6px;
  background: var(--surface); color: var(--text); font-size: 13px; cursor: pointer;
}
.btn:disabled { opacity: .45; cursor: not-allowed; }
.btn.primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.btn.danger { border-color: var(--complaint); color: var(--complaint); }

.busy { display: none; align-items: center; gap: 10px; color: var(--muted); margin-top: 14px; }
.busy.show { display: flex; }
.busy .track { flex: 1; height: 4px; background: var(--border); border-radius: 2px; overflow: hidden; position: relative; }
.busy .track::after {
  content: ''; position: absolute; width: 30%; height: 100%; background: var(--accent);
  animation: slide 1.1s ease-in-out infinite;
}
@keyframes slide { from { left: -30%; } to { left: 100%; } }

.charts { display: grid; grid-template-columns: 3fr 2fr; gap: 16px; }
.legend { display: flex; gap: 14px; font-size: 12px; color: var(--muted); margin-top: 8px; }
.legend i { display: inline-block; width: 10px; height: 10px; border-radius: 2px; margin-right: 4px; }
.warning { color: var(--warn); font-size: 13px; margin-top: 10px; }
.empty { text-align: center; color: var(--muted); padding: 28px; }
.hidden { display: none; }

.toast {
  position: fixed; bottom: 24px; right: 24px; padding: 12px 18px; border-radius: 8px;
  background: var(--other); color: #fff; font-size: 13px; opacity: 0;
  transform: translateY(60px); transition: all .25s; z-index: 10;
}
.toast.show { opacity: 1; transform: none; }
.toast.error { background: var(--complaint); }

@media (max-width: 760px) { .charts { grid-template-columns: 1fr; } }
</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1><span>AI Hub</span> Complaint Classifier</h1>
      <div class="subtitle">Upload a spreadsheet, pick the text column, classify every row.</div>
    </div>
    <div class="badges">
      <span class="badge" id="badge-service">service …</span>
      <span class="badge" id="badge-model">model …</span>
      <button class="btn" id="btn-init">Initialize model</button>
    </div>
  </header>

  <nav id="nav">
    <button class="active" data-panel="workflow">Analyze</button>
    <button data-panel="history">History</button>
  </nav>

  <div class="panel active" id="panel-workflow">
    <div class="card">
      <h2>1. Upload <small>.xlsx, .xls or .csv</small></h2>
      <div class="dropzone" id="dropzone">
        <strong>Drop a file here</strong> or click to choose one
        <div id="file-label"></div>
      </div>
      <input type="file" id="file-input" accept=".xlsx,.xls,.csv" class="hidden">
    </div>

    <div class="card hidden" id="card-data">
      <h2>2. Review <small id="data-caption"></small></h2>
      <div class="grid" id="overview"></div>
      <div class="table-wrap"><table id="preview-table"></table></div>
      <h2 style="margin-top:18px">Columns</h2>
      <div class="table-wrap"><table id="columns-table"></table></div>
    </div>

    <div class="card hidden" id="card-analyze">
      <h2>3. Analyze</h2>
      <div class="row">
        <select id="column-select"></select>
        <button class="btn primary" id="btn-analyze" disabled>Analyze complaints</button>
        <button class="btn danger" id="btn-reset">Start over</button>
      </div>
      <div class="busy" id="busy"><span>Analyzing…</span><div class="track"></div></div>
    </div>

    <div class="card hidden" id="card-results">
      <h2>Results <small id="results-caption"></small></h2>
      <div class="grid" id="result-stats"></div>
      <div class="charts">
        <div>
          <svg id="bar-chart" viewBox="0 0 420 180" width="100%"></svg>
        </div>
        <div>
          <svg id="pie-chart" viewBox="0 0 200 200" width="100%" style="max-height:220px"></svg>
          <div class="legend" id="pie-legend"></div>
        </div>
      </div>
      <div class="warning hidden" id="partition-warning"></div>
      <div class="row" style="margin-top:16px">
        <button class="btn primary" id="btn-download">Download results</button>
      </div>
    </div>
  </div>

  <div class="panel" id="panel-history">
    <div class="card">
      <h2>Analysis history <small>last 30 days</small></h2>
      <div class="grid" id="history-stats"></div>
      <div class="table-wrap"><table id="history-table"></table></div>
      <div class="empty hidden" id="history-empty">No analyses recorded yet.</div>
    </div>
  </div>
</div>
<div class="toast" id="toast"></div>

<script>
const COLORS = { complaint: '#ef4444', other: '#22c55e' };
let session = null;
let pollTimer = null;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body, headers) {
  const opts = { method, headers: headers || {} };
  if (body !== undefined) {
    if (body instanceof Blob) {
      opts.body = body;
    } else {
      opts.headers['Content-Type'] = 'application/json';
      opts.body = JSON.stringify(body);
    }
  }
  const res = await fetch(path, opts);
  const data = await res.json().catch(() => ({}));
  if (!res.ok) throw new Error(data.error || ('HTTP ' + res.status));
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  clearTimeout(el._t);
  el._t = setTimeout(() => el.className = 'toast', 3500);
}

function esc(s) {
  if (s === undefined || s === null) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

function fmt(n) {
  if (n === undefined || n === null) return '-';
  return Number(n).toLocaleString();
}

function num(n) {
  if (n === undefined || n === null) return '-';
  return Number.isInteger(n) ? fmt(n) : n.toFixed(2);
}

function show(id, visible) {
  document.getElementById(id).classList.toggle('hidden', !visible);
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  const panel = e.target.dataset && e.target.dataset.panel;
  if (!panel) return;
  document.querySelectorAll('nav button').forEach(b => b.classList.toggle('active', b === e.target));
  document.querySelectorAll('.panel').forEach(p => p.classList.toggle('active', p.id === 'panel-' + panel));
  if (panel === 'history') loadHistory();
});

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------
const dropzone = document.getElementById('dropzone');
const fileInput = document.getElementById('file-input');
dropzone.addEventListener('click', () => fileInput.click());
dropzone.addEventListener('dragover', e => { e.preventDefault(); dropzone.classList.add('over'); });
dropzone.addEventListener('dragleave', () => dropzone.classList.remove('over'));
dropzone.addEventListener('drop', e => {
  e.preventDefault();
  dropzone.classList.remove('over');
  if (e.dataTransfer.files.length) upload(e.dataTransfer.files[0]);
});
fileInput.addEventListener('change', () => {
  if (fileInput.files.length) upload(fileInput.files[0]);
  fileInput.value = '';
});

async function upload(file) {
  if (!/\.(xlsx|xls|csv)$/i.test(file.name)) {
    toast('Please upload an Excel (.xlsx, .xls) or CSV file', true);
    return;
  }
  try {
    session = await api('POST', '/api/upload', file, { 'X-File-Name': encodeURIComponent(file.name) });
    toast('Loaded ' + file.name + ' (' + fmt(session.data.total_rows) + ' rows)');
  } catch (e) {
    toast(e.message, true);
    session = await api('GET', '/api/session').catch(() => session);
  }
  render();
}

// ---------------------------------------------------------------------------
// Column selection / analyze / download / reset
// ---------------------------------------------------------------------------
document.getElementById('column-select').addEventListener('change', async e => {
  if (!e.target.value) return;
  try {
    session = await api('POST', '/api/column', { column: e.target.value });
  } catch (err) {
    toast(err.message, true);
  }
  render();
});

document.getElementById('btn-analyze').addEventListener('click', async () => {
  if (!session || !session.data) return toast('Please upload a file first', true);
  if (!session.selected_column) return toast('Please select a column containing the text data', true);

  document.getElementById('btn-analyze').disabled = true;
  document.getElementById('busy').classList.add('show');
  try {
    session = await api('POST', '/api/analyze');
    toast('Analysis complete');
  } catch (e) {
    toast(e.message, true);
    session = await api('GET', '/api/session').catch(() => session);
  }
  document.getElementById('busy').classList.remove('show');
  render();
});

document.getElementById('btn-download').addEventListener('click', async () => {
  try {
    const res = await fetch('/api/download');
    if (!res.ok) {
      const data = await res.json().catch(() => ({}));
      throw new Error(data.error || ('HTTP ' + res.status));
    }
    const blob = await res.blob();
    const a = document.createElement('a');
    a.href = URL.createObjectURL(blob);
    a.download = session.result.filename;
    document.body.appendChild(a);
    a.click();
    a.remove();
    URL.revokeObjectURL(a.href);
  } catch (e) {
    toast(e.message, true);
  }
});

document.getElementById('btn-reset').addEventListener('click', async () => {
  session = await api('POST', '/api/reset').catch(e => { toast(e.message, true); return session; });
  render();
});

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------
function render() {
  const s = session || {};
  const data = s.data;
  document.getElementById('file-label').textContent = s.file_name ? 'Current file: ' + s.file_name : '';
  show('card-data', !!data);
  show('card-analyze', !!data);
  show('card-results', !!s.result);
  if (!data) return;

  document.getElementById('data-caption').textContent =
    'showing ' + data.rows.length + ' of ' + fmt(data.total_rows) + ' rows';
  renderOverview(s.overview);
  renderPreview(data, s.selected_column);
  renderColumns(s.columns);
  renderColumnSelect(data.headers, s.selected_column);
  document.getElementById('btn-analyze').disabled = !s.selected_column || s.stage === 'analyzing';

  if (s.result) renderResults(s.result, s.view);
}

function renderOverview(o) {
  document.getElementById('overview').innerHTML = o ? [
    stat(fmt(o.total_rows), 'Rows'),
    stat(o.total_columns, 'Columns'),
    stat(o.completeness.toFixed(1) + '%', 'Completeness'),
    stat(o.numeric_columns, 'Numeric columns'),
  ].join('') : '';
}

function renderPreview(data, selected) {
  const idx = data.headers.indexOf(selected);
  const head = '<tr>' + data.headers.map((h, i) =>
    `<th class="${i === idx ? 'sel' : ''}">${esc(h)}</th>`).join('') + '</tr>';
  const body = data.rows.map(r => '<tr>' + r.map((c, i) =>
    `<td class="${i === idx ? 'sel' : ''}" title="${esc(c)}">${esc(c)}</td>`).join('') + '</tr>').join('');
  document.getElementById('preview-table').innerHTML = '<thead>' + head + '</thead><tbody>' + body + '</tbody>';
}

function renderColumns(columns) {
  const head = '<tr><th>Column</th><th class="num">Filled</th><th class="num">Empty</th>' +
    '<th class="num">Min</th><th class="num">Max</th><th class="num">Avg</th></tr>';
  const body = (columns || []).map(c => `<tr>
    <td>${esc(c.name)}</td>
    <td class="num">${fmt(c.total_values)}</td>
    <td class="num">${fmt(c.empty_values)}</td>
    <td class="num">${c.is_numeric ? num(c.min) : '-'}</td>
    <td class="num">${c.is_numeric ? num(c.max) : '-'}</td>
    <td class="num">${c.is_numeric ? num(c.avg) : '-'}</td></tr>`).join('');
  document.getElementById('columns-table').innerHTML = '<thead>' + head + '</thead><tbody>' + body + '</tbody>';
}

function renderColumnSelect(headers, selected) {
  const sel = document.getElementById('column-select');
  sel.innerHTML = '<option value="">Select the text column…</option>' +
    headers.map(h => `<option value="${esc(h)}" ${h === selected ? 'selected' : ''}>${esc(h)}</option>`).join('');
}

function renderResults(result, view) {
  const c = view.classes[0], n = view.classes[1];
  document.getElementById('results-caption').textContent = 'column "' + result.text_column + '"';
  const cards = [
    stat(fmt(view.total_processed), 'Total processed'),
    stat(fmt(c.count), 'Complaints (' + c.percentage.toFixed(1) + '%)', 'complaint'),
    stat(fmt(n.count), 'Non-complaints (' + n.percentage.toFixed(1) + '%)', 'other'),
    stat(view.accuracy.toFixed(1) + '%', 'Accuracy'),
  ];
  if (view.average_confidence !== undefined && view.average_confidence !== null) {
    cards.push(stat(view.average_confidence.toFixed(2), 'Avg confidence'));
  }
  if (view.processing_time !== undefined && view.processing_time !== null) {
    cards.push(stat(view.processing_time.toFixed(1) + 's', 'Processing time'));
  }
  document.getElementById('result-stats').innerHTML = cards.join('');
  document.getElementById('bar-chart').innerHTML = barChart(view.classes);
  document.getElementById('pie-chart').innerHTML = pieChart(view.classes);
  document.getElementById('pie-legend').innerHTML = view.classes.map(k =>
    `<span><i style="background:${k.color}"></i>${esc(k.label)} ${k.percentage.toFixed(1)}%</span>`).join('');

  const warn = document.getElementById('partition-warning');
  warn.textContent = view.partition_consistent ? '' :
    `Complaints (${fmt(c.count)}) + non-complaints (${fmt(n.count)}) do not add up to the ${fmt(view.total_processed)} rows processed.`;
  warn.classList.toggle('hidden', view.partition_consistent);
}

function stat(value, label, cls) {
  return `<div class="stat"><div class="value ${cls || ''}">${esc(value)}</div><div class="label">${esc(label)}</div></div>`;
}

function barChart(classes) {
  const max = Math.max(1, ...classes.map(k => k.count));
  const barW = 110, gap = 80, base = 150, height = 120;
  return classes.map((k, i) => {
    const h = Math.round((k.count / max) * height);
    const x = 60 + i * (barW + gap);
    return `<rect x="${x}" y="${base - h}" width="${barW}" height="${h}" rx="4" fill="${k.color}"></rect>
      <text x="${x + barW / 2}" y="${base - h - 6}" fill="#e5e9f5" font-size="12" text-anchor="middle">${fmt(k.count)}</text>
      <text x="${x + barW / 2}" y="${base + 18}" fill="#8a94b3" font-size="12" text-anchor="middle">${esc(k.label)}</text>`;
  }).join('') + `<line x1="40" y1="${base}" x2="400" y2="${base}" stroke="#263151"></line>`;
}

function pieChart(classes) {
  const total = classes.reduce((sum, k) => sum + k.count, 0);
  if (total === 0) return '<circle cx="100" cy="100" r="80" fill="#263151"></circle>';
  let angle = -Math.PI / 2;
  return classes.filter(k => k.count > 0).map(k => {
    const share = k.count / total;
    if (share >= 1) return `<circle cx="100" cy="100" r="80" fill="${k.color}"></circle>`;
    const start = angle;
    angle += share * 2 * Math.PI;
    const large = share > 0.5 ? 1 : 0;
    const x1 = 100 + 80 * Math.cos(start), y1 = 100 + 80 * Math.sin(start);
    const x2 = 100 + 80 * Math.cos(angle), y2 = 100 + 80 * Math.sin(angle);
    return `<path d="M100,100 L${x1},${y1} A80,80 0 ${large} 1 ${x2},${y2} Z" fill="${k.color}"></path>`;
  }).join('');
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------
async function loadHistory() {
  try {
    const h = await api('GET', '/api/history?days=30');
    document.getElementById('history-stats').innerHTML = [
      stat(h.total_runs, 'Runs'),
      stat(h.failed_runs, 'Failed'),
      stat(fmt(h.total_processed), 'Rows processed'),
      stat(h.complaint_rate.toFixed(1) + '%', 'Complaint rate'),
    ].join('');
    show('history-empty', h.files.length === 0);
    document.getElementById('history-table').innerHTML = h.files.length === 0 ? '' :
      '<thead><tr><th>File</th><th class="num">Runs</th><th class="num">Processed</th>' +
      '<th class="num">Complaints</th><th class="num">Rate</th><th>Last run</th></tr></thead><tbody>' +
      h.files.map(f => `<tr><td>${esc(f.file_name)}</td><td class="num">${f.runs}</td>
        <td class="num">${fmt(f.total_processed)}</td><td class="num">${fmt(f.total_complaints)}</td>
        <td class="num">${f.complaint_rate.toFixed(1)}%</td><td>${esc(f.last_run.slice(0, 16).replace('T', ' '))}</td></tr>`).join('') +
      '</tbody>';
  } catch (e) {
    toast(e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Service / model status
// ---------------------------------------------------------------------------
function setBadge(id, text, cls) {
  const el = document.getElementById(id);
  el.textContent = text;
  el.className = 'badge ' + cls;
}

async function loadHealth() {
  try {
    const h = await api('GET', '/api/health');
    setBadge('badge-service', h.service_reachable ? 'service online' : 'service offline',
      h.service_reachable ? 'ok' : 'err');
    schedulePoll(h.poll_interval_secs);
  } catch (e) {
    setBadge('badge-service', 'service unknown', 'warn');
    schedulePoll(5);
  }
}

async function pollStatus() {
  try {
    const s = await api('GET', '/api/status');
    const cls = s.status === 'ready' ? 'ok' : s.status === 'loading' ? 'warn' : 'err';
    let text = 'model ' + s.status;
    if (s.device) text += ' · ' + s.device;
    setBadge('badge-model', text, cls);
  } catch (e) {
    setBadge('badge-model', 'model unavailable', 'err');
  }
}

function schedulePoll(seconds) {
  clearInterval(pollTimer);
  pollStatus();
  pollTimer = setInterval(pollStatus, Math.max(1, seconds) * 1000);
}

document.getElementById('btn-init').addEventListener('click', async () => {
  try {
    const r = await api('POST', '/api/initialize');
    toast(r.message || 'Model initialization started');
    pollStatus();
  } catch (e) {
    toast(e.message, true);
  }
});

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
loadHealth();
api('GET', '/api/session').then(s => { session = s; render(); }).catch(() => {});
</script>
</body>
</html>"##;
