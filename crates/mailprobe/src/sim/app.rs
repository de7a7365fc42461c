//! Simulated webmail: the login page and the folders/labels settings screen.
//!
//! State lives here; every driver call renders a fresh [`Dom`] from it, so
//! locators are always resolved against the current UI. Mutations publish
//! the same request/response sequence the live backend produces.

use super::dom::{Dom, El};
use crate::locator::Locator;
use crate::model::{display_path, Folder, Label, LabelColor};
use crate::network::{HttpMethod, NetworkEvent, EVENTS_API, LABELS_API};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Cookie;
use std::collections::HashMap;

/// Origin of the simulated mail app
pub const SIM_BASE_URL: &str = "https://mail.sim.test";

/// Origin of the simulated identity provider
pub const SIM_ACCOUNT_URL: &str = "https://account.sim.test";

/// Cookie that marks an authenticated browser
pub const SIM_AUTH_COOKIE: &str = "AUTH-sim";

/// Driver calls an alert stays on screen
const ALERT_TTL: u32 = 4;

/// A row on the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    /// Folder row
    Folder(u64),
    /// Label row
    Label(u64),
}

/// What a click does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing
    Noop,
    /// "Add folder"
    OpenCreateFolder,
    /// "Add label"
    OpenCreateLabel,
    /// Sort folders button
    SortFolders,
    /// Sort labels button
    SortLabels,
    /// "Use folder colors" toggle
    ToggleFolderColors,
    /// Row "Edit" button
    OpenEdit(Item),
    /// Row menu opener
    OpenRowMenu(Item),
    /// Row menu "Edit"
    MenuEdit,
    /// Row menu "Delete"
    MenuDelete,
    /// Confirmation modal "Delete"
    ConfirmDelete,
    /// Confirmation modal "Cancel"
    CancelDelete,
    /// Folder location dropdown
    ToggleParentDropdown,
    /// Folder location choice
    PickParent(Option<u64>),
    /// Label color dropdown
    ToggleColorDropdown,
    /// Label color swatch
    PickColor(LabelColor),
    /// Folder notification toggle
    ToggleNotify,
    /// Form "Save"
    Save,
    /// Form "Cancel"
    Cancel,
    /// Login "keep me signed in"
    ToggleStaySignedIn,
    /// Login submit
    SubmitLogin,
}

/// Inputs that accept `fill`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Folder or label name in the edit modal
    ItemName,
    /// Login username
    Username,
    /// Login password
    Password,
}

/// Seed data for a simulated account
#[derive(Debug, Clone)]
pub struct SimState {
    base_url: String,
    account_url: String,
    account: Option<(String, String)>,
    folders: Vec<Folder>,
    labels: Vec<Label>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            base_url: SIM_BASE_URL.to_string(),
            account_url: SIM_ACCOUNT_URL.to_string(),
            account: None,
            folders: Vec::new(),
            labels: Vec::new(),
        }
    }
}

impl SimState {
    /// Empty account on the default origins
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept these credentials (any non-empty pair is accepted otherwise)
    #[must_use]
    pub fn with_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.account = Some((username.into(), password.into()));
        self
    }

    /// Seed a folder; a parent must be seeded first
    #[must_use]
    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }

    /// Seed a label
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, color: LabelColor) -> Self {
        self.labels.push(Label::new(name, color));
        self
    }

    /// Mail app origin
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Identity provider origin
    #[must_use]
    pub fn account_url(&self) -> &str {
        &self.account_url
    }
}

#[derive(Debug, Clone)]
struct FolderRow {
    id: u64,
    name: String,
    parent: Option<u64>,
    notify: bool,
}

#[derive(Debug, Clone)]
struct LabelRow {
    id: u64,
    name: String,
    color: LabelColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    CreateFolder,
    EditFolder(u64),
    CreateLabel,
    EditLabel(u64),
}

impl FormKind {
    const fn is_folder(self) -> bool {
        matches!(self, Self::CreateFolder | Self::EditFolder(_))
    }
}

#[derive(Debug, Clone)]
struct Form {
    kind: FormKind,
    name: String,
    parent: Option<u64>,
    notify: bool,
    color: LabelColor,
    parent_open: bool,
    color_open: bool,
    show_required: bool,
}

impl Form {
    const fn new(kind: FormKind) -> Self {
        Self {
            kind,
            name: String::new(),
            parent: None,
            notify: true,
            color: LabelColor::Purple,
            parent_open: false,
            color_open: false,
            show_required: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Blank,
    Login,
    Inbox,
    Settings,
}

#[derive(Debug, Default)]
struct LoginForm {
    username: String,
    password: String,
    stay_signed_in: bool,
    failed: bool,
}

#[derive(Debug)]
struct Alert {
    text: String,
    ttl: u32,
}

/// Live simulated browser tab plus backend
#[derive(Debug)]
pub(crate) struct App {
    base_url: String,
    account_url: String,
    account: Option<(String, String)>,
    folders: Vec<FolderRow>,
    labels: Vec<LabelRow>,
    next_id: u64,
    event_seq: u64,
    use_folder_colors: bool,
    view: View,
    url: String,
    cookies: Vec<Cookie>,
    storage: HashMap<String, HashMap<String, String>>,
    form: Option<Form>,
    menu: Option<Item>,
    confirm: Option<Item>,
    alert: Option<Alert>,
    login: LoginForm,
}

fn host_of(origin: &str) -> &str {
    origin.split_once("://").map_or(origin, |(_, host)| host)
}

fn split_url(url: &str) -> Option<(&str, &str)> {
    let scheme_end = url.find("://")? + 3;
    match url[scheme_end..].find('/') {
        Some(slash) => Some((&url[..scheme_end + slash], &url[scheme_end + slash..])),
        None => Some((url, "/")),
    }
}

fn is_settings_path(path: &str) -> bool {
    path.strip_prefix("/u/")
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(index, rest)| {
            !index.is_empty()
                && index.chars().all(|c| c.is_ascii_digit())
                && rest.trim_end_matches('/') == "mail/folders-labels"
        })
}

impl App {
    pub(crate) fn new(state: SimState) -> Self {
        let mut app = Self {
            base_url: state.base_url,
            account_url: state.account_url,
            account: state.account,
            folders: Vec::new(),
            labels: Vec::new(),
            next_id: 1,
            event_seq: 0,
            use_folder_colors: false,
            view: View::Blank,
            url: "about:blank".to_string(),
            cookies: Vec::new(),
            storage: HashMap::new(),
            form: None,
            menu: None,
            confirm: None,
            alert: None,
            login: LoginForm::default(),
        };
        for folder in state.folders {
            let parent = folder
                .parent
                .as_deref()
                .and_then(|p| app.folders.iter().find(|f| f.name == p).map(|f| f.id));
            let id = app.allocate_id();
            app.folders.push(FolderRow {
                id,
                name: folder.name,
                parent,
                notify: folder.notify,
            });
        }
        for label in state.labels {
            let id = app.allocate_id();
            app.labels.push(LabelRow {
                id,
                name: label.name,
                color: label.color,
            });
        }
        app
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn auth_cookie(&self) -> Cookie {
        Cookie::new(SIM_AUTH_COOKIE, "sim-session", host_of(&self.base_url))
            .secure()
            .http_only()
    }

    fn is_authenticated(&self) -> bool {
        self.cookies
            .iter()
            .any(|c| c.name == SIM_AUTH_COOKIE && !c.value.is_empty())
    }

    /// Advance UI timers by one driver call
    pub(crate) fn tick(&mut self) {
        if let Some(alert) = &mut self.alert {
            alert.ttl = alert.ttl.saturating_sub(1);
            if alert.ttl == 0 {
                self.alert = None;
            }
        }
    }

    fn show_alert(&mut self, text: String) {
        self.alert = Some(Alert {
            text,
            ttl: ALERT_TTL,
        });
    }

    fn origin(&self) -> &str {
        split_url(&self.url).map_or("", |(origin, _)| origin)
    }

    pub(crate) fn current_url(&self) -> &str {
        &self.url
    }

    pub(crate) fn folder_names(&self) -> Vec<String> {
        self.folders.iter().map(|f| self.display_name(f)).collect()
    }

    pub(crate) fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.name.clone()).collect()
    }

    fn display_name(&self, folder: &FolderRow) -> String {
        let parent = folder
            .parent
            .and_then(|p| self.folders.iter().find(|f| f.id == p))
            .map(|p| self.display_name(p));
        display_path(parent.as_deref(), &folder.name)
    }

    // ------------------------------------------------------------------
    // Browser surface
    // ------------------------------------------------------------------

    pub(crate) fn navigate(&mut self, url: &str, events: &mut Vec<NetworkEvent>) -> ProbeResult<()> {
        self.form = None;
        self.menu = None;
        self.confirm = None;
        self.alert = None;
        self.login.failed = false;

        if url == "about:blank" {
            self.view = View::Blank;
            self.url = url.to_string();
            return Ok(());
        }

        let (origin, path) = split_url(url).ok_or_else(|| ProbeError::Navigation {
            url: url.to_string(),
            message: "not an absolute URL".to_string(),
        })?;

        events.push(NetworkEvent::request(HttpMethod::Get, url));
        if origin == self.account_url {
            self.view = View::Login;
            self.url = url.to_string();
        } else if origin == self.base_url {
            if !self.is_authenticated() {
                self.view = View::Login;
                self.url = format!("{}/login", self.account_url);
            } else if is_settings_path(path) {
                self.view = View::Settings;
                self.url = url.to_string();
            } else {
                self.view = View::Inbox;
                self.url = url.to_string();
            }
        } else {
            return Err(ProbeError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        events.push(NetworkEvent::response(url, 200));
        Ok(())
    }

    pub(crate) fn click(&mut self, locator: &Locator, events: &mut Vec<NetworkEvent>) -> ProbeResult<()> {
        let dom = self.render();
        let id = dom.actionable(locator)?;
        match dom.action_for(id) {
            Some(action) => {
                tracing::debug!(?action, "simulated click");
                self.apply(action, events);
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let dom = self.render();
        let id = dom.actionable(locator)?;
        let field = dom.node(id).field.ok_or_else(|| ProbeError::NotActionable {
            locator: locator.to_string(),
            reason: "element is not an <input>".to_string(),
        })?;
        match field {
            Field::ItemName => {
                if let Some(form) = &mut self.form {
                    form.name = value.to_string();
                }
            }
            Field::Username => self.login.username = value.to_string(),
            Field::Password => self.login.password = value.to_string(),
        }
        Ok(())
    }

    pub(crate) fn cookies(&self) -> Vec<Cookie> {
        self.cookies.clone()
    }

    pub(crate) fn set_cookies(&mut self, cookies: &[Cookie]) {
        for cookie in cookies {
            self.cookies
                .retain(|c| !(c.name == cookie.name && c.domain == cookie.domain));
            self.cookies.push(cookie.clone());
        }
    }

    pub(crate) fn local_storage(&self) -> HashMap<String, String> {
        self.storage.get(self.origin()).cloned().unwrap_or_default()
    }

    pub(crate) fn set_local_storage(&mut self, entries: &HashMap<String, String>) {
        let origin = self.origin().to_string();
        self.storage.entry(origin).or_default().extend(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    // ------------------------------------------------------------------
    // Backend
    // ------------------------------------------------------------------

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn events_round_trip(&mut self, events: &mut Vec<NetworkEvent>) {
        self.event_seq += 1;
        let url = self.api(&format!("{EVENTS_API}/{:016x}", self.event_seq));
        events.push(NetworkEvent::request(HttpMethod::Get, &url));
        events.push(NetworkEvent::response(url, 200));
    }

    fn call(&mut self, method: HttpMethod, path: &str, events: &mut Vec<NetworkEvent>) {
        let url = self.api(path);
        events.push(NetworkEvent::request(method, &url));
        events.push(NetworkEvent::response(url, 200));
        self.events_round_trip(events);
    }

    fn folder_subtree(&self, id: u64) -> Vec<u64> {
        let mut ids = vec![id];
        let mut i = 0;
        while i < ids.len() {
            let current = ids[i];
            ids.extend(
                self.folders
                    .iter()
                    .filter(|f| f.parent == Some(current))
                    .map(|f| f.id),
            );
            i += 1;
        }
        ids
    }

    fn delete(&mut self, item: Item, events: &mut Vec<NetworkEvent>) {
        let (id, name) = match item {
            Item::Folder(id) => {
                let Some(folder) = self.folders.iter().find(|f| f.id == id) else {
                    return;
                };
                let name = folder.name.clone();
                let doomed = self.folder_subtree(id);
                self.folders.retain(|f| !doomed.contains(&f.id));
                (id, name)
            }
            Item::Label(id) => {
                let Some(label) = self.labels.iter().find(|l| l.id == id) else {
                    return;
                };
                let name = label.name.clone();
                self.labels.retain(|l| l.id != id);
                (id, name)
            }
        };
        self.call(HttpMethod::Delete, &format!("{LABELS_API}/{id}"), events);
        self.events_round_trip(events);
        self.show_alert(format!("{name} removed"));
    }

    fn save(&mut self, events: &mut Vec<NetworkEvent>) {
        let Some(mut form) = self.form.take() else {
            return;
        };
        let name = form.name.trim().to_string();
        if name.is_empty() {
            form.show_required = true;
            self.form = Some(form);
            return;
        }
        match form.kind {
            FormKind::CreateFolder => {
                let id = self.allocate_id();
                self.folders.push(FolderRow {
                    id,
                    name: name.clone(),
                    parent: form.parent,
                    notify: form.notify,
                });
                self.call(HttpMethod::Post, LABELS_API, events);
                self.show_alert(format!("{name} created"));
            }
            FormKind::CreateLabel => {
                let id = self.allocate_id();
                self.labels.push(LabelRow {
                    id,
                    name: name.clone(),
                    color: form.color,
                });
                self.call(HttpMethod::Post, LABELS_API, events);
                self.show_alert(format!("{name} created"));
            }
            FormKind::EditFolder(id) => {
                if let Some(folder) = self.folders.iter_mut().find(|f| f.id == id) {
                    folder.name = name.clone();
                    folder.parent = form.parent;
                    folder.notify = form.notify;
                }
                self.call(HttpMethod::Put, &format!("{LABELS_API}/{id}"), events);
                self.show_alert(format!("{name} updated"));
            }
            FormKind::EditLabel(id) => {
                if let Some(label) = self.labels.iter_mut().find(|l| l.id == id) {
                    label.name = name.clone();
                    label.color = form.color;
                }
                self.call(HttpMethod::Put, &format!("{LABELS_API}/{id}"), events);
                self.show_alert(format!("{name} updated"));
            }
        }
    }

    fn open_edit(&mut self, item: Item) {
        let form = match item {
            Item::Folder(id) => self.folders.iter().find(|f| f.id == id).map(|f| Form {
                name: f.name.clone(),
                parent: f.parent,
                notify: f.notify,
                ..Form::new(FormKind::EditFolder(id))
            }),
            Item::Label(id) => self.labels.iter().find(|l| l.id == id).map(|l| Form {
                name: l.name.clone(),
                color: l.color,
                ..Form::new(FormKind::EditLabel(id))
            }),
        };
        self.form = form;
    }

    fn submit_login(&mut self, events: &mut Vec<NetworkEvent>) {
        let url = format!("{}/api/auth/v4", self.account_url);
        events.push(NetworkEvent::request(HttpMethod::Post, &url));
        let accepted = match &self.account {
            Some((user, pass)) => self.login.username == *user && self.login.password == *pass,
            None => !self.login.username.is_empty() && !self.login.password.is_empty(),
        };
        if !accepted {
            events.push(NetworkEvent::response(url, 422));
            self.login.failed = true;
            return;
        }
        events.push(NetworkEvent::response(url, 200));

        let mut cookie = self.auth_cookie();
        if self.login.stay_signed_in {
            cookie = cookie.with_expires(chrono::Utc::now().timestamp() + 30 * 24 * 3600);
        }
        self.set_cookies(&[cookie]);
        self.storage
            .entry(self.base_url.clone())
            .or_default()
            .insert("ps-0".to_string(), format!("{{\"UID\":\"sim-{}\"}}", self.login.username));
        self.storage
            .entry(self.account_url.clone())
            .or_default()
            .insert("fp-0".to_string(), "{\"trusted\":true}".to_string());

        let inbox = format!("{}/u/0/mail/inbox", self.base_url);
        self.view = View::Inbox;
        events.push(NetworkEvent::request(HttpMethod::Get, &inbox));
        events.push(NetworkEvent::response(&inbox, 200));
        self.url = inbox;
    }

    fn apply(&mut self, action: Action, events: &mut Vec<NetworkEvent>) {
        match action {
            Action::Noop => {}
            Action::OpenCreateFolder => self.form = Some(Form::new(FormKind::CreateFolder)),
            Action::OpenCreateLabel => self.form = Some(Form::new(FormKind::CreateLabel)),
            Action::SortFolders => {
                self.folders.sort_by(|a, b| a.name.cmp(&b.name));
                self.call(HttpMethod::Put, &format!("{LABELS_API}/order"), events);
            }
            Action::SortLabels => {
                self.labels.sort_by(|a, b| a.name.cmp(&b.name));
                self.call(HttpMethod::Put, &format!("{LABELS_API}/order"), events);
            }
            Action::ToggleFolderColors => {
                self.use_folder_colors = !self.use_folder_colors;
                self.call(HttpMethod::Put, "/api/mail/v4/settings/folder-colors", events);
            }
            Action::OpenEdit(item) => self.open_edit(item),
            Action::OpenRowMenu(item) => self.menu = Some(item),
            Action::MenuEdit => {
                if let Some(item) = self.menu.take() {
                    self.open_edit(item);
                }
            }
            Action::MenuDelete => self.confirm = self.menu.take(),
            Action::ConfirmDelete => {
                if let Some(item) = self.confirm.take() {
                    self.delete(item, events);
                }
            }
            Action::CancelDelete => self.confirm = None,
            Action::ToggleParentDropdown => {
                if let Some(form) = &mut self.form {
                    form.parent_open = !form.parent_open;
                }
            }
            Action::PickParent(parent) => {
                if let Some(form) = &mut self.form {
                    form.parent = parent;
                    form.parent_open = false;
                }
            }
            Action::ToggleColorDropdown => {
                if let Some(form) = &mut self.form {
                    form.color_open = !form.color_open;
                }
            }
            Action::PickColor(color) => {
                if let Some(form) = &mut self.form {
                    form.color = color;
                    form.color_open = false;
                }
            }
            Action::ToggleNotify => {
                if let Some(form) = &mut self.form {
                    form.notify = !form.notify;
                }
            }
            Action::Save => self.save(events),
            Action::Cancel => self.form = None,
            Action::ToggleStaySignedIn => self.login.stay_signed_in = !self.login.stay_signed_in,
            Action::SubmitLogin => self.submit_login(events),
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub(crate) fn render(&self) -> Dom {
        let body = match self.view {
            View::Blank => El::new("body"),
            View::Login => self.render_login(),
            View::Inbox => El::new("body")
                .child(header())
                .child(El::new("main").child(El::new("h1").text("Inbox"))),
            View::Settings => self.render_settings(),
        };
        Dom::build(El::new("html").child(body))
    }

    fn render_login(&self) -> El {
        let mut form = El::new("form").id("login").children([
            El::new("h1").text("Sign in"),
            El::new("label").attr("for", "username").text("Email or username"),
            El::new("input")
                .id("username")
                .attr("type", "text")
                .field(Field::Username, &self.login.username),
            El::new("label").attr("for", "password").text("Password"),
            El::new("input")
                .id("password")
                .attr("type", "password")
                .field(Field::Password, &self.login.password),
            El::new("input")
                .id("staySignedIn")
                .attr("type", "checkbox")
                .checked(self.login.stay_signed_in)
                .on_click(Action::ToggleStaySignedIn),
            El::new("label").attr("for", "staySignedIn").text("Keep me signed in"),
            El::new("button")
                .attr("type", "submit")
                .text("Sign in")
                .on_click(Action::SubmitLogin),
        ]);
        if self.login.failed {
            form = form.child(
                El::new("div")
                    .attr("role", "alert")
                    .text("Incorrect login credentials. Please try again."),
            );
        }
        El::new("body").child(El::new("main").child(form))
    }

    fn render_settings(&self) -> El {
        let mut body = El::new("body").child(header()).child(
            El::new("main").children([self.folder_section(), self.label_section()]),
        );
        if let Some(alert) = &self.alert {
            body = body.child(
                El::new("div").class("notifications").child(
                    El::new("div")
                        .class("notification")
                        .attr("role", "alert")
                        .text(alert.text.clone()),
                ),
            );
        }
        if let Some(form) = &self.form {
            body = body.child(self.form_modal(form));
        }
        if self.menu.is_some() {
            body = body.child(
                El::new("div").class("dropdown").attr("role", "menu").child(
                    El::new("ul").children([
                        El::new("li").child(
                            El::new("button")
                                .test_id("folders/labels:item-edit")
                                .text("Edit")
                                .on_click(Action::MenuEdit),
                        ),
                        El::new("li").child(
                            El::new("button")
                                .test_id("folders/labels:item-delete")
                                .text("Delete")
                                .on_click(Action::MenuDelete),
                        ),
                    ]),
                ),
            );
        }
        if let Some(item) = self.confirm {
            let kind = match item {
                Item::Folder(_) => "folder",
                Item::Label(_) => "label",
            };
            body = body.child(
                El::new("div")
                    .class("modal alert-modal")
                    .attr("role", "dialog")
                    .children([
                        El::new("h2").text(format!("Delete {kind}")),
                        El::new("p").text(format!("Are you sure you want to delete this {kind}?")),
                        El::new("div").class("alert-modal-footer").children([
                            El::new("button").text("Cancel").on_click(Action::CancelDelete),
                            El::new("button").text("Delete").on_click(Action::ConfirmDelete),
                        ]),
                    ]),
            );
        }
        body
    }

    fn folder_section(&self) -> El {
        El::new("section").id("folders").children([
            El::new("h2").text("Folders"),
            El::new("label").attr("for", "folder-colors").text("Use folder colors"),
            El::new("input")
                .id("folder-colors")
                .attr("type", "checkbox")
                .checked(self.use_folder_colors)
                .on_click(Action::ToggleFolderColors),
            El::new("button").text("Add folder").on_click(Action::OpenCreateFolder),
            El::new("button")
                .title("Sort folders alphabetically")
                .on_click(Action::SortFolders),
            El::new("div").id("folderlist").child(
                El::new("div").child(El::new("ul").children(self.folder_items(None, None))),
            ),
        ])
    }

    fn folder_items(&self, parent: Option<u64>, prefix: Option<&str>) -> Vec<El> {
        self.folders
            .iter()
            .filter(|f| f.parent == parent)
            .map(|folder| {
                let display = display_path(prefix, &folder.name);
                let item = Item::Folder(folder.id);
                let mut icon = El::new("svg").class("folder-icon");
                if self.use_folder_colors {
                    icon = icon.style("fill", LabelColor::Purple.css_rgb());
                }
                let mut li = El::new("li")
                    .title(display.clone())
                    .test_id("folders/labels:item-type:folder")
                    .child(El::new("div").class("row").children([
                        El::new("div").class("name-cell").children([
                            icon,
                            El::new("span")
                                .title(display.clone())
                                .test_id("folders/labels:item-name")
                                .text(folder.name.clone()),
                        ]),
                        El::new("button").text("Edit").on_click(Action::OpenEdit(item)),
                        El::new("button")
                            .test_id("dropdown:open")
                            .title("More options")
                            .on_click(Action::OpenRowMenu(item)),
                    ]));
                let children = self.folder_items(Some(folder.id), Some(&display));
                if !children.is_empty() {
                    li = li.child(El::new("ul").children(children));
                }
                li
            })
            .collect()
    }

    fn label_section(&self) -> El {
        let items = self.labels.iter().map(|label| {
            let item = Item::Label(label.id);
            El::new("li")
                .test_id("folders/labels:item-type:label")
                .child(El::new("div").class("row").children([
                    El::new("div").class("name-cell").child(
                        El::new("div").class("label-name").children([
                            El::new("svg")
                                .class("label-icon")
                                .style("fill", label.color.css_rgb()),
                            El::new("span")
                                .title(label.name.clone())
                                .test_id("folders/labels:item-name")
                                .text(label.name.clone()),
                        ]),
                    ),
                    El::new("button").text("Edit").on_click(Action::OpenEdit(item)),
                    El::new("button")
                        .test_id("dropdown:open")
                        .title("More options")
                        .on_click(Action::OpenRowMenu(item)),
                ]))
        });
        El::new("section").id("labels").children([
            El::new("h2").text("Labels"),
            El::new("button").text("Add label").on_click(Action::OpenCreateLabel),
            El::new("button")
                .title("Sort labels alphabetically")
                .on_click(Action::SortLabels),
            El::new("div")
                .id("labellist")
                .child(El::new("ul").children(items)),
        ])
    }

    fn form_modal(&self, form: &Form) -> El {
        let folder = form.kind.is_folder();
        let heading = match form.kind {
            FormKind::CreateFolder => "Create folder",
            FormKind::EditFolder(_) => "Edit folder",
            FormKind::CreateLabel => "Create label",
            FormKind::EditLabel(_) => "Edit label",
        };
        let mut fields = Vec::new();
        if folder {
            fields.push(El::new("label").attr("for", "folder").text("Folder name"));
            fields.push(
                El::new("input")
                    .id("folder")
                    .attr("type", "text")
                    .attr("placeholder", "Folder name")
                    .field(Field::ItemName, &form.name),
            );
        } else {
            fields.push(El::new("label").attr("for", "label-name").text("Name"));
            fields.push(
                El::new("input")
                    .id("label-name")
                    .attr("type", "text")
                    .attr("placeholder", "Label name")
                    .field(Field::ItemName, &form.name),
            );
        }
        if form.show_required {
            fields.push(El::new("div").class("error").text("This field is required"));
        }

        if folder {
            fields.extend(self.location_fields(form));
            fields.push(El::new("label").attr("for", "notification").text("Notification"));
            fields.push(
                El::new("input")
                    .id("notification")
                    .attr("type", "checkbox")
                    .checked(form.notify)
                    .on_click(Action::ToggleNotify),
            );
        } else {
            fields.push(
                El::new("button")
                    .id("color-button")
                    .attr("type", "button")
                    .on_click(Action::ToggleColorDropdown)
                    .children([
                        El::new("svg").style("fill", form.color.css_rgb()),
                        El::new("span").text("Color"),
                    ]),
            );
            if form.color_open {
                fields.push(
                    El::new("ul")
                        .class("color-selector")
                        .children(LabelColor::ALL.into_iter().map(|color| {
                            El::new("li")
                                .class("color-selector-item")
                                .title(color.title())
                                .style("color", color.css_rgb())
                                .on_click(Action::PickColor(color))
                        })),
                );
            }
        }

        El::new("div")
            .class("modal")
            .attr("role", "dialog")
            .children([
                El::new("h2").text(heading),
                El::new("form").children(fields),
                El::new("div").class("modal-footer").children([
                    El::new("button").text("Cancel").on_click(Action::Cancel),
                    El::new("button")
                        .attr("type", "submit")
                        .text("Save")
                        .on_click(Action::Save),
                ]),
            ])
    }

    fn location_fields(&self, form: &Form) -> Vec<El> {
        let excluded = match form.kind {
            FormKind::EditFolder(id) => self.folder_subtree(id),
            _ => Vec::new(),
        };
        let current = form
            .parent
            .and_then(|p| self.folders.iter().find(|f| f.id == p))
            .map_or_else(|| "No parent folder".to_string(), |f| f.name.clone());

        let mut fields = vec![
            El::new("label").attr("for", "parentID").text("Folder location"),
            El::new("button")
                .id("parentID")
                .attr("type", "button")
                .on_click(Action::ToggleParentDropdown)
                .child(El::new("span").text(current)),
        ];
        if form.parent_open {
            let options = std::iter::once(
                El::new("li").class("dropdown-item").child(
                    El::new("button")
                        .on_click(Action::PickParent(None))
                        .child(El::new("span").text("No parent folder")),
                ),
            )
            .chain(
                self.folders
                    .iter()
                    .filter(|f| !excluded.contains(&f.id))
                    .map(|f| {
                        El::new("li").class("dropdown-item").child(
                            El::new("button")
                                .on_click(Action::PickParent(Some(f.id)))
                                .child(El::new("span").text(f.name.clone())),
                        )
                    }),
            );
            fields.push(El::new("ul").class("dropdown").children(options));
        }
        fields
    }
}

fn header() -> El {
    El::new("header").child(
        El::new("button")
            .test_id("heading:userdropdown")
            .text("Account"),
    )
}
