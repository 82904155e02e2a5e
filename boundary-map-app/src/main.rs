mod render;

use anyhow::anyhow;
use boundary_map::{
    core::geo::Point,
    data::source::{FeatureSource, HttpFeatureSource},
    html_to_text,
    tiles::{Basemap, TileSource},
    ui::sidebar::Dispatch,
    GeoJson, LayerKind, SidebarController, StartupQueue, UiEvent, Viewer, ViewerConfig,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use render::TileTextures;
use std::{sync::Arc, time::Duration};

/// Environment variable naming a JSON viewer configuration
const CONFIG_ENV: &str = "BOUNDARY_MAP_CONFIG";

type LoadResult = (LayerKind, boundary_map::Result<GeoJson>);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => ViewerConfig::load(&path).map_err(|e| anyhow!(e))?,
        None => ViewerConfig::default(),
    };

    // Built outside any runtime context so the UI thread can block freely
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let source = Arc::new(HttpFeatureSource::new(&config).map_err(|e| anyhow!(e))?);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("NC Election Boundaries"),
        ..Default::default()
    };

    eframe::run_native(
        "boundary-map-app",
        options,
        Box::new(move |cc| Box::new(BoundaryMapApp::new(cc, config, runtime, source))),
    )
    .map_err(|e| anyhow!("{}", e))?;

    Ok(())
}

struct BoundaryMapApp {
    viewer: Viewer,
    sidebar: SidebarController,
    startup: StartupQueue,
    runtime: tokio::runtime::Runtime,
    source: Arc<HttpFeatureSource>,
    loads_tx: Sender<LoadResult>,
    loads_rx: Receiver<LoadResult>,
    tiles: TileTextures,
    last_error: Option<String>,
}

impl BoundaryMapApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        config: ViewerConfig,
        runtime: tokio::runtime::Runtime,
        source: Arc<HttpFeatureSource>,
    ) -> Self {
        let (loads_tx, loads_rx) = unbounded();
        let tiles = TileTextures::new(&config.tiles);
        let mut viewer = Viewer::new(config);
        let sidebar = SidebarController::new(&viewer.config().default_layers);

        viewer.map_mut().on("baselayerchange", |event| {
            log::info!("base layer changed: {:?}", event);
        });

        let layers = viewer.startup_layers();
        let mut app = Self {
            viewer,
            sidebar,
            startup: StartupQueue::new(layers.clone()),
            runtime,
            source,
            loads_tx,
            loads_rx,
            tiles,
            last_error: None,
        };

        for kind in layers {
            app.viewer.begin_load(kind);
            app.spawn_fetch(&cc.egui_ctx, kind);
        }
        app
    }

    /// Fetches `kind` on the runtime; the result comes back over `loads_rx`
    fn spawn_fetch(&self, ctx: &egui::Context, kind: LayerKind) {
        let source = self.source.clone();
        let tx = self.loads_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = source.fetch(kind).await;
            let _ = tx.send((kind, result));
            ctx.request_repaint();
        });
    }

    fn apply_loads(&mut self) {
        while let Ok((kind, result)) = self.loads_rx.try_recv() {
            for (kind, result) in self.startup.push(kind, result) {
                match self.sidebar.complete(&mut self.viewer, kind, result) {
                    Ok(()) => self.last_error = None,
                    Err(e) => {
                        self.last_error = Some(format!("Could not load {}: {}", kind.label(), e))
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: UiEvent) {
        if let Dispatch::Fetch(kind) = self.sidebar.dispatch(&mut self.viewer, &event) {
            self.spawn_fetch(ctx, kind);
        }
    }

    fn sidebar_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        ui.separator();

        let mut events = Vec::new();
        for binding in self.sidebar.bindings() {
            ui.horizontal(|ui| {
                let mut checked = self.sidebar.is_checked(binding.kind);
                if ui.checkbox(&mut checked, binding.kind.label()).changed() {
                    events.push(UiEvent::toggle(binding.toggle_id, checked));
                }
                let loaded = self.viewer.registry().contains(binding.kind);
                if ui.add_enabled(loaded, egui::Button::new("Fit")).clicked() {
                    events.push(UiEvent::click(binding.fit_id));
                }
            });
        }

        ui.separator();
        ui.label("Base map");
        let current = self.viewer.map().basemap();
        for basemap in Basemap::ALL {
            if ui.radio(current == basemap, basemap.name()).clicked() {
                events.push(UiEvent::BasemapSelected { basemap });
            }
        }

        let ctx = ui.ctx().clone();
        for event in events {
            if event.is_map_event() {
                self.viewer.handle_map_event(&event);
            } else {
                self.dispatch(&ctx, event);
            }
        }

        if self.viewer.is_loading() {
            ui.separator();
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.label("Loading…");
            });
        }
        if let Some(error) = &self.last_error {
            ui.colored_label(egui::Color32::from_rgb(185, 28, 28), error);
        }

        ui.separator();
        ui.heading("Feature");
        match self.viewer.feature_panel() {
            Some(html) => ui.label(html_to_text(html)),
            None => ui.weak("Click a boundary to see its details"),
        };
    }

    fn map_panel(&mut self, ui: &mut egui::Ui) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let local = |pos: egui::Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        let size = Point::new(rect.width() as f64, rect.height() as f64);
        if self.viewer.map().viewport().size != size {
            self.viewer.handle_map_event(&UiEvent::Resized { size });
        }

        if response.dragged() {
            let drag = response.drag_delta();
            self.viewer.handle_map_event(&UiEvent::Panned {
                delta: Point::new(-drag.x as f64, -drag.y as f64),
            });
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let zoom = self.viewer.map().viewport().zoom + (scroll as f64 / 120.0);
                self.viewer.handle_map_event(&UiEvent::Zoomed {
                    zoom,
                    focus: response.hover_pos().map(local),
                });
            }
        }

        match response.hover_pos() {
            Some(pos) => {
                let position = self.viewer.map().viewport().pixel_to_lat_lng(&local(pos));
                self.viewer.handle_map_event(&UiEvent::PointerMoved { position });
            }
            None if self.viewer.hovered().is_some() => {
                self.viewer.handle_map_event(&UiEvent::PointerLeft);
            }
            None => {}
        }

        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let position = self.viewer.map().viewport().pixel_to_lat_lng(&local(pos));
                self.viewer.handle_map_event(&UiEvent::MapClicked { position });
            }
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(230, 230, 230));
        let map = self.viewer.map();
        self.tiles
            .paint(ui.ctx(), &painter, rect, map.base_layer(), map.viewport());
        render::paint_overlays(&painter, rect, &self.viewer);

        painter.text(
            rect.right_bottom() - egui::Vec2::new(4.0, 4.0),
            egui::Align2::RIGHT_BOTTOM,
            map.base_layer().source().attribution(),
            egui::FontId::proportional(11.0),
            egui::Color32::from_gray(60),
        );

        self.popup(ui.ctx(), rect);
    }

    fn popup(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let Some(popup) = self.viewer.map().popup() else {
            return;
        };
        let anchor = self.viewer.map().viewport().lat_lng_to_pixel(&popup.position);
        let pos = rect.min + egui::Vec2::new(anchor.x as f32, anchor.y as f32);
        if !rect.contains(pos) {
            return;
        }

        let text = popup.text();
        let max_width = popup.max_width as f32;
        let mut close = false;
        egui::Area::new(egui::Id::new("feature-popup"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(max_width);
                    ui.horizontal(|ui| {
                        ui.label(text);
                        close = ui.small_button("×").clicked();
                    });
                });
            });

        if close {
            self.viewer.map_mut().close_popup();
        }
    }
}

impl eframe::App for BoundaryMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_loads();
        self.tiles.poll();

        egui::SidePanel::left("sidebar")
            .resizable(true)
            .min_width(220.0)
            .show(ctx, |ui| self.sidebar_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.map_panel(ui));

        for event in self.viewer.map_mut().process_events() {
            log::trace!("{:?}", event);
        }

        if self.viewer.is_loading() || self.tiles.has_pending() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
