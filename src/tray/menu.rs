//! StatusNotifier tray icon and its menu

use ksni::menu::{MenuItem, StandardItem, SubMenu};
use ksni::{ToolTip, Tray};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use super::TrayEvent;
use super::ipc_handler::Outbox;
use super::mirror::{FavoriteGroup, MirrorState, SurfaceState};
use crate::constants::tray;
use crate::favorites::FavoriteEntry;
use crate::ipc::TrayMessage;

pub struct ResolutionTray {
    pub mirror: MirrorState,
    outbox: Outbox,
    events: UnboundedSender<TrayEvent>,
}

impl ResolutionTray {
    pub fn new(mirror: MirrorState, outbox: Outbox, events: UnboundedSender<TrayEvent>) -> Self {
        Self {
            mirror,
            outbox,
            events,
        }
    }

    fn apply_favorite(&self, entry: &FavoriteEntry) {
        let message = TrayMessage::ApplyFavoriteResolution {
            resolution: entry.resolution.clone(),
            monitor_id: entry.monitor_id.clone(),
        };
        if !self.outbox.send(message) {
            warn!(resolution = %entry.resolution, "Manager not running, cannot apply favorite");
        }
    }

    fn show_manager(&self) {
        if self.outbox.send(TrayMessage::ShowManager) {
            return;
        }
        info!("Manager not running, launching it");
        if let Err(e) = launch_manager() {
            warn!(error = %format!("{e:#}"), "Failed to launch manager");
        }
    }

    fn quit(&self) {
        self.outbox.send(TrayMessage::Quit);
        let _ = self.events.send(TrayEvent::Quit);
    }
}

/// Start a manager window process from the same binary
fn launch_manager() -> anyhow::Result<()> {
    use anyhow::Context;
    let exe = std::env::current_exe().context("Failed to get current executable path")?;
    std::process::Command::new(&exe)
        .spawn()
        .with_context(|| format!("Failed to spawn {}", exe.display()))?;
    Ok(())
}

/// Menu text for a favorite, e.g. `1920x1080 @ 60Hz (Work)`
pub fn item_label(entry: &FavoriteEntry) -> String {
    let base = entry
        .parsed()
        .map(|resolution| resolution.menu_label())
        .unwrap_or_else(|| entry.resolution.clone());
    match entry.label.as_deref() {
        Some(label) => format!("{base} ({label})"),
        None => base,
    }
}

fn group_menu(group: FavoriteGroup) -> MenuItem<ResolutionTray> {
    let submenu = if group.entries.is_empty() {
        vec![placeholder("No favorites")]
    } else {
        group
            .entries
            .into_iter()
            .map(|entry| {
                MenuItem::Standard(StandardItem {
                    label: item_label(&entry),
                    activate: Box::new(move |this: &mut ResolutionTray| this.apply_favorite(&entry)),
                    ..Default::default()
                })
            })
            .collect()
    };
    MenuItem::SubMenu(SubMenu {
        label: group.title,
        submenu,
        ..Default::default()
    })
}

fn placeholder(label: &str) -> MenuItem<ResolutionTray> {
    MenuItem::Standard(StandardItem {
        label: label.to_string(),
        enabled: false,
        ..Default::default()
    })
}

impl Tray for ResolutionTray {
    fn id(&self) -> String {
        tray::ID.into()
    }

    fn title(&self) -> String {
        tray::TITLE.into()
    }

    fn icon_name(&self) -> String {
        tray::ICON_NAME.into()
    }

    fn tool_tip(&self) -> ToolTip {
        ToolTip {
            title: tray::TITLE.into(),
            description: format!("{} favorites", self.mirror.favorites().len()),
            ..Default::default()
        }
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        let mut items = vec![placeholder(tray::TITLE), MenuItem::Separator];

        // Bootstrapped favorites stay visible while a manager answers the pull
        let loading = match self.mirror.state() {
            SurfaceState::Ready => false,
            SurfaceState::Loading => self.mirror.favorites().is_empty(),
            SurfaceState::Uninitialized => true,
        };
        if loading {
            items.push(placeholder("Loading favorites..."));
        } else {
            items.extend(self.mirror.groups().into_iter().map(group_menu));
        }

        items.push(MenuItem::Separator);
        items.push(MenuItem::Standard(StandardItem {
            label: "Show Manager".into(),
            activate: Box::new(|this: &mut Self| this.show_manager()),
            ..Default::default()
        }));
        items.push(MenuItem::Standard(StandardItem {
            label: "Quit".into(),
            activate: Box::new(|this: &mut Self| this.quit()),
            ..Default::default()
        }));
        items
    }

    /// Left click opens the manager
    fn activate(&mut self, _x: i32, _y: i32) {
        self.show_manager();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::ManagerMessage;
    use tokio::sync::mpsc::unbounded_channel;

    fn entry(resolution: &str, monitor_id: Option<&str>, label: Option<&str>) -> FavoriteEntry {
        FavoriteEntry {
            resolution: resolution.to_string(),
            monitor_id: monitor_id.map(str::to_string),
            label: label.map(str::to_string),
        }
    }

    fn submenu_labels(item: &MenuItem<ResolutionTray>) -> (String, Vec<String>) {
        let MenuItem::SubMenu(sub) = item else {
            panic!("submenu expected");
        };
        let labels = sub
            .submenu
            .iter()
            .filter_map(|i| match i {
                MenuItem::Standard(s) => Some(s.label.clone()),
                _ => None,
            })
            .collect();
        (sub.label.clone(), labels)
    }

    #[test]
    fn test_item_label() {
        assert_eq!(item_label(&entry("1920x1080", None, None)), "1920x1080 @ 60Hz");
        assert_eq!(
            item_label(&entry("2560x1440@144", Some("0"), Some("Gaming"))),
            "2560x1440 @ 144Hz (Gaming)"
        );
    }

    #[test]
    fn test_menu_layout() {
        let (tx, mut rx) = unbounded_channel();
        let mut mirror = MirrorState::new();
        mirror.apply(ManagerMessage::FavoritesUpdated(vec![
            entry("1920x1080", Some("0"), None),
            entry("1280x720", None, Some("Projector")),
        ]));
        let mut tray = ResolutionTray::new(mirror, Outbox::default(), tx);

        let menu = tray.menu();
        // header, separator, global, monitor 0, separator, show, quit
        assert_eq!(menu.len(), 7);
        assert_eq!(
            submenu_labels(&menu[2]),
            ("Global Favorites".to_string(), vec!["1280x720 @ 60Hz (Projector)".to_string()])
        );
        assert_eq!(
            submenu_labels(&menu[3]),
            ("Monitor 0".to_string(), vec!["1920x1080 @ 60Hz".to_string()])
        );

        let MenuItem::Standard(quit) = &menu[6] else {
            panic!("quit item expected");
        };
        assert_eq!(quit.label, "Quit");
        (quit.activate)(&mut tray);
        assert!(matches!(rx.try_recv(), Ok(TrayEvent::Quit)));
    }

    #[test]
    fn test_menu_after_abandoned_pull() {
        let (tx, _rx) = unbounded_channel();
        let mut mirror = MirrorState::new();
        mirror.begin_pull();
        mirror.fail_pull();
        let tray = ResolutionTray::new(mirror, Outbox::default(), tx);

        let menu = tray.menu();
        assert_eq!(
            submenu_labels(&menu[2]),
            ("Global Favorites".to_string(), vec!["No favorites".to_string()])
        );
    }

    #[test]
    fn test_loading_menu() {
        let (tx, _rx) = unbounded_channel();
        let mut mirror = MirrorState::new();
        mirror.begin_pull();
        let tray = ResolutionTray::new(mirror, Outbox::default(), tx);

        let menu = tray.menu();
        let MenuItem::Standard(item) = &menu[2] else {
            panic!("placeholder expected");
        };
        assert!(!item.enabled);
    }
}
