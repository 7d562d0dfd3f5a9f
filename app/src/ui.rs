use crate::app::{DemoApp, Tab};

use eframe::egui::{self, Color32, Ui};
use pseudolab::Rotation;

const PREVIEW_SIZE: egui::Vec2 = egui::vec2(320.0, 240.0);

/// Draws the entire left-side panel with all the controls.
pub fn draw_side_panel(app: &mut DemoApp, ctx: &egui::Context) {
    egui::SidePanel::left("controls_panel").show(ctx, |ui| {
        ui.heading("pseudolab");
        ui.separator();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut app.tab, Tab::PseudoLabels, "Pseudo-labels");
            ui.selectable_value(&mut app.tab, Tab::Rotation, "Rotation");
        });
        ui.separator();

        match app.tab {
            Tab::PseudoLabels => draw_labeling_controls(app, ui),
            Tab::Rotation => draw_rotation_controls(app, ui),
        }
    });
}

/// Draws the central panel for whichever demo is selected.
pub fn draw_central_panel(app: &mut DemoApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| match app.tab {
        Tab::PseudoLabels => draw_labeling_view(app, ui),
        Tab::Rotation => draw_rotation_view(app, ui),
    });
}

fn draw_labeling_controls(app: &mut DemoApp, ui: &mut Ui) {
    ui.heading("Images");
    let has_images = !app.labeler.images().is_empty();
    let busy = app.is_bulk_labeling();

    ui.horizontal(|ui| {
        if ui.add_enabled(!busy, egui::Button::new("Choose files...")).clicked() {
            app.pick_label_files();
        }
        if ui.add_enabled(!busy, egui::Button::new("Default images")).clicked() {
            app.load_label_defaults();
        }
    });
    if ui.add_enabled(has_images && !busy, egui::Button::new("Clear images")).clicked() {
        app.clear_label_images();
    }
    ui.label(&app.images_status);
    ui.separator();

    ui.heading("Labeling");
    let allow_labeling = app.labeler.is_ready() && has_images && !busy;
    let ctx = ui.ctx().clone();
    ui.horizontal(|ui| {
        if ui.add_enabled(allow_labeling, egui::Button::new("Label random")).clicked() {
            app.label_random(&ctx);
        }
        if ui.add_enabled(allow_labeling, egui::Button::new("Label all")).clicked() {
            app.start_label_all();
        }
    });
    ui.separator();

    // Clicking a name labels that image.
    egui::ScrollArea::vertical().id_salt("label_images").show(ui, |ui| {
        let current = app.labeler.current_index();
        let mut clicked = None;
        for (index, entry) in app.labeler.images().iter().enumerate() {
            if ui
                .selectable_label(current == Some(index), entry.name())
                .clicked()
            {
                clicked = Some(index);
            }
        }
        if let Some(index) = clicked {
            if allow_labeling {
                app.label_index(&ctx, index);
            }
        }
    });
}

fn draw_labeling_view(app: &mut DemoApp, ui: &mut Ui) {
    ui.label(&app.label_status);
    ui.label(format!(
        "Current image: {}",
        app.labeler.current_name().unwrap_or("N/A")
    ));
    ui.separator();

    match &app.label_preview {
        Some(texture) => {
            ui.add(egui::Image::new(texture).max_size(PREVIEW_SIZE));
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(PREVIEW_SIZE, egui::Sense::hover());
            ui.painter().rect_filled(rect, 0.0, Color32::from_rgb(0x0b, 0x0d, 0x1c));
        }
    }
    ui.separator();

    ui.heading("Results");
    let results = app.labeler.current_results();
    if results.is_empty() {
        ui.label("No predictions yet.");
    } else {
        for result in results {
            ui.label(result.to_string());
        }
    }
    ui.separator();

    ui.heading("History");
    egui::ScrollArea::vertical().id_salt("label_history").show(ui, |ui| {
        if app.labeler.history().is_empty() {
            ui.label("No pseudo-labels yet. Ask the model to describe an image.");
        }
        for entry in app.labeler.history().entries() {
            ui.strong(&entry.name);
            ui.label(format!("top: {}", entry.top));
            if !entry.alternates.is_empty() {
                let alts: Vec<String> = entry.alternates.iter().map(ToString::to_string).collect();
                ui.label(format!("alt: {}", alts.join(", ")));
            }
            ui.add_space(4.0);
        }
    });
}

fn draw_rotation_controls(app: &mut DemoApp, ui: &mut Ui) {
    let running = app.controller.is_running();

    ui.heading("Images");
    ui.horizontal(|ui| {
        if ui.add_enabled(!running, egui::Button::new("Choose files...")).clicked() {
            app.pick_rotation_files();
        }
        if ui.add_enabled(!running, egui::Button::new("Default images")).clicked() {
            app.load_rotation_defaults();
        }
    });
    let has_images = !app.session.images().is_empty();
    if ui.add_enabled(has_images, egui::Button::new("Clear images")).clicked() {
        app.clear_rotation_images();
    }
    ui.label(format!("{} image(s) loaded", app.session.images().len()));
    ui.separator();

    ui.heading("Loop");
    ui.horizontal(|ui| {
        let can_start = !running && has_images && app.session.embedder_ready();
        if ui.add_enabled(can_start, egui::Button::new("Start")).clicked() {
            app.start_loop();
        }
        if ui.add_enabled(running, egui::Button::new("Stop")).clicked() {
            app.stop_loop();
        }
    });
    let mut delay_ms = app.delay_ms;
    ui.horizontal(|ui| {
        ui.label("Delay:");
        if ui
            .add(egui::DragValue::new(&mut delay_ms).range(0..=5000).suffix(" ms"))
            .changed()
        {
            app.set_delay(delay_ms);
        }
    });
    ui.separator();

    ui.heading("Reset");
    ui.horizontal(|ui| {
        if ui.button("Reset stats").clicked() {
            app.reset_stats();
        }
        if ui.button("Clear model").clicked() {
            app.clear_model();
        }
    });
}

fn draw_rotation_view(app: &mut DemoApp, ui: &mut Ui) {
    ui.label(&app.rotation_status);
    ui.label(app.session.stats().to_string());
    ui.separator();

    ui.heading("Examples per rotation");
    let cap = app.session.store().cap();
    for (rotation, count) in app.session.store().class_counts() {
        ui.horizontal(|ui| {
            ui.colored_label(DemoApp::rotation_color(rotation), rotation.to_string());
            ui.add(
                egui::ProgressBar::new(count as f32 / cap as f32)
                    .text(format!("{count} / {cap}"))
                    .desired_width(200.0),
            );
        });
    }
    ui.separator();

    ui.heading("Last test");
    if let Some(texture) = &app.crop_preview {
        ui.add(egui::Image::new(texture).max_size(egui::vec2(224.0, 224.0)));
    }
    if let Some(trial) = &app.last_trial {
        ui.label(format!("{}: true {}", trial.image_name, trial.truth));
        for rotation in Rotation::ALL {
            let confidence = trial.prediction.confidence(rotation);
            let text = format!("{rotation}: {:.0}%", confidence * 100.0);
            if rotation == trial.prediction.label {
                ui.colored_label(DemoApp::rotation_color(rotation), format!("{text}  (predicted)"));
            } else {
                ui.label(text);
            }
        }
    }
}
