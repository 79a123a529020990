//! Live dashboard page
//!
//! A single static page: a form to submit readings, lists of vitals, alerts
//! and messages, and a WebSocket on `/events` that triggers a refresh on
//! every message status change.

use axum::response::Html;

/// GET /
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Vitals Monitor</title>
  <style>
    body { font-family: system-ui, sans-serif; background: #f4f5f7; margin: 0; padding: 24px; }
    main { max-width: 1100px; margin: 0 auto; }
    section { background: #fff; border-radius: 8px; padding: 16px; margin-bottom: 16px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
    h2 { font-size: 15px; color: #555; margin: 0 0 12px; }
    .cols { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
    .list { max-height: 280px; overflow-y: auto; font-size: 14px; }
    .row { padding: 6px 4px; border-bottom: 1px solid #eee; }
    .abnormal { color: #b71c1c; }
    .normal { color: #1b5e20; }
    .badge { padding: 2px 6px; border-radius: 4px; font-size: 12px; }
    .QUEUED { background: #fff3e0; }
    .PROCESSING { background: #e3f2fd; }
    .SENT { background: #e8f5e9; }
    .muted { color: #999; font-size: 12px; }
    input { width: 90px; padding: 6px; }
    #patient { width: 140px; }
  </style>
</head>
<body>
<main>
  <h1>Vitals Monitor</h1>
  <section>
    <h2>Submit reading</h2>
    <input id="patient" value="patient-1">
    <input id="systolic" type="number" value="120">
    <input id="diastolic" type="number" value="80">
    <button onclick="submitForm()">Submit</button>
    <button onclick="submitReading(120, 80)">Normal 120/80</button>
    <button onclick="submitReading(190, 130)">Abnormal 190/130</button>
  </section>
  <div class="cols">
    <section><h2>Vitals</h2><div class="list" id="vitals"></div></section>
    <section><h2>Alerts</h2><div class="list" id="alerts"></div></section>
  </div>
  <section><h2>Messages</h2><div class="list" id="messages"></div></section>
</main>
<script>
  const escape = (text) => String(text).replace(/[&<>"']/g, (c) =>
    ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' })[c]);
  const time = (secs) => secs ? new Date(secs * 1000).toLocaleTimeString() : '';
  const abnormal = (v) => v.systolic > 180 || v.diastolic > 120;
  const fill = (id, items, render, empty) => {
    document.getElementById(id).innerHTML = items.length
      ? items.slice().reverse().map(render).join('')
      : '<div class="muted">' + empty + '</div>';
  };

  function submitReading(systolic, diastolic) {
    const patient_id = document.getElementById('patient').value || 'patient-1';
    fetch('/vitals', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ patient_id, systolic, diastolic, taken_at: Math.floor(Date.now() / 1000) })
    }).then(refresh);
  }

  function submitForm() {
    submitReading(
      parseInt(document.getElementById('systolic').value) || 0,
      parseInt(document.getElementById('diastolic').value) || 0);
  }

  function refresh() {
    fetch('/vitals').then(r => r.json()).then(d => fill('vitals', d.vitals || [], v =>
      '<div class="row ' + (abnormal(v) ? 'abnormal' : 'normal') + '"><b>' + escape(v.patient_id) + '</b> ' +
      v.systolic + '/' + v.diastolic + ' <span class="muted">' + time(v.received_at) + '</span></div>',
      'No vitals yet'));
    fetch('/alerts').then(r => r.json()).then(d => fill('alerts', d.alerts || [], a =>
      '<div class="row abnormal"><b>' + escape(a.vital.patient_id) + '</b> ' + escape(a.reason) +
      ' <span class="muted">' + time(a.created_at) + '</span></div>',
      'No alerts'));
    fetch('/messages').then(r => r.json()).then(d => fill('messages', d.messages || [], m =>
      '<div class="row"><span class="badge ' + m.status + '">' + m.status + '</span> <b>' +
      escape(m.patient_id) + '</b> ' + escape(m.content) + ' <span class="muted">' +
      time(m.status === 'SENT' ? m.sent_at : m.queued_at) + '</span></div>',
      'No messages'));
  }

  function connect() {
    const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const socket = new WebSocket(scheme + location.host + '/events');
    socket.onmessage = (event) => {
      if (JSON.parse(event.data).type === 'message_update') refresh();
    };
    socket.onclose = () => setTimeout(connect, 2000);
  }

  connect();
  refresh();
</script>
</body>
</html>
"#;
