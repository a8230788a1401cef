//! The single-page chat UI served at `/`.
//!
//! Plain HTML and JavaScript against the JSON API; no build step. Each tab
//! creates its own session on load.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>AI Document Chat</title>
<style>
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, sans-serif; display: flex; height: 100vh; color: #222; }
  aside { width: 300px; padding: 1rem; background: #f4f5f7; border-right: 1px solid #ddd; overflow-y: auto; }
  aside h2 { font-size: 1rem; margin: 1.2rem 0 .4rem; }
  aside button { width: 100%; margin-top: .4rem; padding: .45rem; cursor: pointer; }
  .status { font-size: .85rem; margin: .4rem 0; white-space: pre-wrap; }
  .status.ok { color: #1a7f37; }
  .status.err { color: #cf222e; }
  .preview { font-family: ui-monospace, monospace; font-size: .75rem; background: #fff; border: 1px solid #ddd;
             padding: .4rem; max-height: 12rem; overflow: auto; white-space: pre; }
  main { flex: 1; display: flex; flex-direction: column; }
  header { padding: .8rem 1rem; border-bottom: 1px solid #ddd; display: flex; justify-content: space-between; }
  #log { flex: 1; overflow-y: auto; padding: 1rem; }
  .msg { max-width: 80ch; margin: .5rem 0; padding: .6rem .8rem; border-radius: 8px; white-space: pre-wrap; }
  .msg.user { background: #dbeafe; margin-left: auto; }
  .msg.assistant { background: #f1f1f1; }
  .msg.error { background: #ffebe9; color: #cf222e; }
  form { display: flex; gap: .5rem; padding: 1rem; border-top: 1px solid #ddd; }
  form input { flex: 1; padding: .6rem; }
  .thinking { font-style: italic; color: #666; padding: 0 1rem .5rem; min-height: 1.4rem; }
</style>
</head>
<body>
<aside>
  <h2>PDF document</h2>
  <input type="file" id="pdf-file" accept=".pdf,application/pdf">
  <div id="pdf-status" class="status"></div>
  <div id="pdf-preview" class="preview" hidden></div>

  <h2>Data file (CSV / XLSX)</h2>
  <input type="file" id="data-file" accept=".csv,.xlsx">
  <div id="data-status" class="status"></div>
  <div id="data-preview" class="preview" hidden></div>

  <h2>Session</h2>
  <button id="clear-chat">Clear chat</button>
  <button id="remove-files">Remove files</button>
  <p class="status">Ask for a "pdf report" to download the last answer.</p>
</aside>
<main>
  <header>
    <strong>AI Document Chat</strong>
    <span>Requests: <span id="count">0</span></span>
  </header>
  <div id="log"></div>
  <div id="thinking" class="thinking"></div>
  <form id="chat">
    <input id="input" autocomplete="off" placeholder="Ask about your documents...">
    <button type="submit">Send</button>
  </form>
</main>
<script>
const $ = (id) => document.getElementById(id);
let sessionId = null;

async function api(path, options = {}) {
  const res = await fetch(`/api/sessions${path}`, options);
  const body = res.status === 204 ? null : await res.json();
  if (!res.ok) {
    if (body && body.code === "SESSION_NOT_FOUND" && path !== "") {
      await startSession();
      render({ messages: [], request_count: 0, pdf_loaded: false, data_loaded: false });
      throw new Error("Session expired. A new session has started; please upload your files again.");
    }
    const err = new Error(body && body.error ? body.error : res.statusText);
    err.details = body && body.details;
    throw err;
  }
  return body;
}

async function startSession() {
  const created = await api("", { method: "POST" });
  sessionId = created.session_id;
}

function addMessage(role, text) {
  const div = document.createElement("div");
  div.className = `msg ${role}`;
  div.textContent = text;
  $("log").appendChild(div);
  $("log").scrollTop = $("log").scrollHeight;
}

function render(snapshot) {
  $("log").innerHTML = "";
  snapshot.messages.forEach((m) => addMessage(m.role, m.content));
  $("count").textContent = snapshot.request_count;
  if (!snapshot.pdf_loaded) { $("pdf-status").textContent = ""; $("pdf-preview").hidden = true; }
  if (!snapshot.data_loaded) { $("data-status").textContent = ""; $("data-preview").hidden = true; }
}

function setStatus(kind, ok, text, preview) {
  const status = $(`${kind}-status`);
  status.className = `status ${ok ? "ok" : "err"}`;
  status.textContent = text;
  const pre = $(`${kind}-preview`);
  pre.hidden = !preview;
  pre.textContent = preview || "";
}

function download(report) {
  const bytes = Uint8Array.from(atob(report.data_base64), (c) => c.charCodeAt(0));
  const url = URL.createObjectURL(new Blob([bytes], { type: report.mime_type }));
  const a = document.createElement("a");
  a.href = url;
  a.download = report.file_name;
  a.textContent = `Download ${report.file_name}`;
  const div = document.createElement("div");
  div.className = "msg assistant";
  div.appendChild(a);
  $("log").appendChild(div);
}

async function upload(kind, input) {
  const file = input.files[0];
  if (!file) return;
  const form = new FormData();
  form.append("file", file, file.name);
  setStatus(kind, true, "Processing...", "");
  try {
    const out = await api(`/${sessionId}/${kind}`, { method: "POST", body: form });
    setStatus(kind, true, out.message, out.preview);
  } catch (e) {
    setStatus(kind, false, e.message, "");
  }
  input.value = "";
}

$("pdf-file").addEventListener("change", (e) => upload("pdf", e.target));
$("data-file").addEventListener("change", (e) => upload("data", e.target));

$("clear-chat").addEventListener("click", async () => {
  render(await api(`/${sessionId}/clear`, { method: "POST" }));
});

$("remove-files").addEventListener("click", async () => {
  render(await api(`/${sessionId}/files`, { method: "DELETE" }));
});

$("chat").addEventListener("submit", async (e) => {
  e.preventDefault();
  const content = $("input").value;
  if (!content.trim()) return;
  $("input").value = "";
  addMessage("user", content);
  $("thinking").textContent = "Thinking...";
  try {
    const out = await api(`/${sessionId}/messages`, {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify({ content }),
    });
    addMessage("assistant", out.reply);
    $("count").textContent = out.request_count;
    if (out.report) download(out.report);
    if (out.report_error) addMessage("error", `Error generating PDF: ${out.report_error}`);
  } catch (err) {
    addMessage("error", err.details ? `${err.message}\n${err.details}` : err.message);
  } finally {
    $("thinking").textContent = "";
  }
});

window.addEventListener("beforeunload", () => {
  if (sessionId) fetch(`/api/sessions/${sessionId}`, { method: "DELETE", keepalive: true });
});

startSession();
</script>
</body>
</html>
"##;
