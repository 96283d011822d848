//! Binding a form element to the reactive engine.
//!
//! [`bind`] wires a form tree to a [`FormStores`] bundle: it extracts
//! default values, installs delegated event listeners and property
//! watchers, observes tree mutations, and keeps the stores, the controls,
//! and the validation state in sync until [`FormHandle::destroy`] runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use formdom::{
    collect_controls, Element, ElementKind, EventKind, InputType, ListenerId, MutationRecord,
    ObserverId, WatcherId,
};
use log::{error, warn};

use crate::config::{FormConfig, RecoverFn, SubmitFn, TouchTriggers, Transformer, Validator};
use crate::dataset;
use crate::error::BindError;
use crate::extend::{Extender, ExtenderContext, ExtenderHandle};
use crate::extract::{addressable_controls, control_value, default_values, is_addressable};
use crate::path::{
    effective_unset_on_remove, fieldset_prefix, resolve_path, resolve_removed_path, FieldPath,
};
use crate::store::Subscription;
use crate::stores::{FormStores, ValidationRun};
use crate::submit::{run_submit, SubmitOverrides};
use crate::validation::{execute_validation, execute_validation_sync, merge_optional, Debouncer};
use crate::value::{Data, Errors, FieldNode};

/// Errors and warnings split by origin. The stores always hold the merge
/// of both halves, so a debounced run never clobbers immediate results.
#[derive(Default)]
struct ValidationSplit {
    immediate_errors: Option<Errors>,
    debounced_errors: Option<Errors>,
    immediate_warnings: Option<Errors>,
    debounced_warnings: Option<Errors>,
}

/// The engine behind one bound form.
pub struct BoundForm {
    pub(crate) form: Element,
    touch_triggers: TouchTriggers,
    validators: RwLock<Vec<Validator>>,
    warners: RwLock<Vec<Validator>>,
    debounced_validators: RwLock<Vec<Validator>>,
    debounced_warners: RwLock<Vec<Validator>>,
    transformers: RwLock<Vec<Transformer>>,
    pub(crate) on_submit: Option<SubmitFn>,
    pub(crate) on_error: Option<RecoverFn>,
    extender_factories: Vec<Arc<dyn Extender>>,
    // Config-supplied list lengths; extender re-instantiation truncates
    // back to these so extender-added entries never duplicate.
    base_validators: usize,
    base_warners: usize,
    base_transformers: usize,
    pub(crate) stores: FormStores,
    pub(crate) initial: RwLock<Data>,
    pub(crate) controls: RwLock<Vec<Element>>,
    handles: Mutex<Vec<Box<dyn ExtenderHandle>>>,
    listener_ids: Mutex<Vec<ListenerId>>,
    observer_id: Mutex<Option<ObserverId>>,
    watched: Mutex<Vec<(Element, WatcherId)>>,
    subscriptions: Mutex<Vec<Subscription>>,
    split: Mutex<ValidationSplit>,
    debouncer: Debouncer,
    destroyed: AtomicBool,
}

/// Bind a form element to a fresh engine.
///
/// Fails when `form` is not a form element or is already bound. The
/// returned handle is cheap to clone; the engine tears itself down when
/// the last clone drops, or earlier via [`FormHandle::destroy`].
pub fn bind(form: &Element, config: FormConfig) -> Result<FormHandle, BindError> {
    if !form.is_form() {
        return Err(BindError::NotAForm {
            id: form.element_id(),
        });
    }
    if form.get_data(dataset::BOUND).is_some() {
        return Err(BindError::AlreadyBound {
            id: form.element_id(),
        });
    }
    form.set_data(dataset::BOUND, "true");

    let (mut initial, controls) = default_values(form);
    if let Some(values) = &config.initial_values {
        initial.deep_assign(values);
    }
    let stores = FormStores::new(initial.clone());
    let delay = config
        .debounce_delay
        .unwrap_or(FormConfig::DEFAULT_DEBOUNCE_DELAY);

    let engine = Arc::new(BoundForm {
        form: form.clone(),
        touch_triggers: config.touch_triggers,
        base_validators: config.validators.len(),
        base_warners: config.warners.len(),
        base_transformers: config.transformers.len(),
        validators: RwLock::new(config.validators),
        warners: RwLock::new(config.warners),
        debounced_validators: RwLock::new(config.debounced_validators),
        debounced_warners: RwLock::new(config.debounced_warners),
        transformers: RwLock::new(config.transformers),
        on_submit: config.on_submit,
        on_error: config.on_error,
        extender_factories: config.extenders,
        stores,
        initial: RwLock::new(initial),
        controls: RwLock::new(Vec::new()),
        handles: Mutex::new(Vec::new()),
        listener_ids: Mutex::new(Vec::new()),
        observer_id: Mutex::new(None),
        watched: Mutex::new(Vec::new()),
        subscriptions: Mutex::new(Vec::new()),
        split: Mutex::new(ValidationSplit::default()),
        debouncer: Debouncer::new(delay),
        destroyed: AtomicBool::new(false),
    });
    engine.setup(controls);
    Ok(FormHandle { engine })
}

impl BoundForm {
    fn setup(self: &Arc<Self>, controls: Vec<Element>) {
        if self.has_any_validators() {
            self.form.set_attr("novalidate", "true");
        }
        self.reflect_control_datasets(&controls);
        self.install_watchers(&controls);
        *lock_write(&self.controls) = controls.clone();
        self.install_listeners();
        self.install_observer();
        self.install_subscriptions();
        self.instantiate_extenders(controls);
    }

    fn has_any_validators(&self) -> bool {
        !lock_read(&self.validators).is_empty()
            || !lock_read(&self.warners).is_empty()
            || !lock_read(&self.debounced_validators).is_empty()
            || !lock_read(&self.debounced_warners).is_empty()
    }

    // ---- Wiring ----

    fn install_listeners(self: &Arc<Self>) {
        let mut ids = lock_mutex(&self.listener_ids);

        let weak = Arc::downgrade(self);
        ids.push(self.form.add_listener(EventKind::Input, move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.handle_input(&event.target);
            }
        }));

        let weak = Arc::downgrade(self);
        ids.push(self.form.add_listener(EventKind::Change, move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.handle_change(&event.target);
            }
        }));

        let weak = Arc::downgrade(self);
        ids.push(self.form.add_listener(EventKind::Blur, move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.handle_blur(&event.target);
            }
        }));

        let weak = Arc::downgrade(self);
        ids.push(self.form.add_listener(EventKind::Submit, move |event| {
            if !event.target.is_form() {
                return;
            }
            if let Some(engine) = weak.upgrade() {
                engine.spawn_submit();
            }
        }));
    }

    fn install_observer(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let id = self.form.observe(move |record| {
            if let Some(engine) = weak.upgrade() {
                engine.handle_mutation(record);
            }
        });
        *lock_mutex(&self.observer_id) = Some(id);
    }

    fn install_subscriptions(self: &Arc<Self>) {
        let mut subs = lock_mutex(&self.subscriptions);

        let weak = Arc::downgrade(self);
        subs.push(self.stores.data.subscribe(move |_| {
            if let Some(engine) = weak.upgrade() {
                engine.on_data_changed();
            }
        }));

        let weak = Arc::downgrade(self);
        subs.push(self.stores.errors.subscribe(move |errors| {
            if let Some(engine) = weak.upgrade() {
                engine.reflect_validation_messages(errors);
            }
        }));
    }

    fn install_watchers(self: &Arc<Self>, controls: &[Element]) {
        let mut watched = lock_mutex(&self.watched);
        for control in controls {
            if watched.iter().any(|(element, _)| element == control) {
                continue;
            }
            let weak = Arc::downgrade(self);
            let id = control.watch(move |element| {
                if let Some(engine) = weak.upgrade() {
                    engine.handle_watch(element);
                }
            });
            watched.push((control.clone(), id));
        }
    }

    /// Reflect the resolved fieldset prefix and unset-on-remove flag onto
    /// each control's dataset, so both survive detachment from the tree.
    fn reflect_control_datasets(&self, controls: &[Element]) {
        for control in controls {
            control.set_data(dataset::FIELDSET, fieldset_prefix(control));
            control.set_data(
                dataset::UNSET_ON_REMOVE,
                effective_unset_on_remove(control).to_string(),
            );
        }
    }

    fn instantiate_extenders(self: &Arc<Self>, controls: Vec<Element>) {
        let mut handles = lock_mutex(&self.handles);
        for factory in &self.extender_factories {
            handles.push(factory.create(ExtenderContext {
                form: self.form.clone(),
                controls: controls.clone(),
                stores: self.stores.clone(),
                engine: Arc::downgrade(self),
            }));
        }
    }

    // ---- Event handling ----

    fn handle_input(&self, target: &Element) {
        if self.destroyed.load(Ordering::SeqCst) || !self.form.contains(target) {
            return;
        }
        if !is_addressable(target) {
            return;
        }
        // Discrete controls commit on Change, not on Input.
        if matches!(
            target.kind(),
            ElementKind::Select
                | ElementKind::Input(InputType::Checkbox | InputType::Radio | InputType::File)
        ) {
            return;
        }
        let Some(path) = resolve_path(target) else {
            return;
        };
        self.write_data_at(&path, control_value(&self.form, target));
        if self.touch_triggers.input {
            self.touch(&path, target);
        }
    }

    fn handle_change(&self, target: &Element) {
        if self.destroyed.load(Ordering::SeqCst) || !self.form.contains(target) {
            return;
        }
        if !is_addressable(target) {
            return;
        }
        let Some(path) = resolve_path(target) else {
            return;
        };
        if matches!(
            target.kind(),
            ElementKind::Select
                | ElementKind::Input(InputType::Checkbox | InputType::Radio | InputType::File)
        ) {
            self.write_data_at(&path, control_value(&self.form, target));
        }
        if self.touch_triggers.change {
            self.touch(&path, target);
        }
    }

    fn handle_blur(&self, target: &Element) {
        if self.destroyed.load(Ordering::SeqCst) || !is_addressable(target) {
            return;
        }
        let Some(path) = resolve_path(target) else {
            return;
        };
        if self.touch_triggers.blur {
            self.touch(&path, target);
        }
    }

    /// Property watcher callback: programmatic control mutation updates
    /// the data tree without marking the field touched.
    fn handle_watch(&self, element: &Element) {
        if self.destroyed.load(Ordering::SeqCst) || !self.form.contains(element) {
            return;
        }
        if !is_addressable(element) {
            return;
        }
        let Some(path) = resolve_path(element) else {
            return;
        };
        self.write_data_at(&path, control_value(&self.form, element));
    }

    fn spawn_submit(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("submit requires a tokio runtime; ignoring submit event");
            return;
        };
        let engine = Arc::clone(self);
        handle.spawn(async move {
            if let Err(err) = run_submit(&engine, &SubmitOverrides::default()).await {
                error!("submit failed: {err}");
            }
        });
    }

    // ---- Mutation handling ----

    fn handle_mutation(self: &Arc<Self>, record: &MutationRecord) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        let mut removed_controls = Vec::new();
        for node in &record.removed {
            removed_controls.extend(collect_controls(node));
        }
        for control in &removed_controls {
            if control.get_data(dataset::UNSET_ON_REMOVE).as_deref() != Some("true") {
                continue;
            }
            let Some(path) = resolve_removed_path(control) else {
                continue;
            };
            {
                let mut initial = lock_write(&self.initial);
                initial.unset(&path);
            }
            self.stores.touched.update(|touched| {
                touched.unset(&path);
            });
            self.stores.data.update(|data| {
                data.unset(&path);
            });
        }

        if record.added.is_empty() && removed_controls.is_empty() {
            return;
        }
        self.refresh_controls();

        if !record.added.is_empty() {
            let (defaults, _) = default_values(&self.form);
            let touched_defaults = defaults.mirror(false);
            {
                let mut initial = lock_write(&self.initial);
                initial.fill_missing(&defaults);
            }
            self.stores.touched.update(|touched| {
                touched.fill_missing(&touched_defaults);
            });
            self.stores.data.update(|data| {
                data.fill_missing(&defaults);
            });
        }

        self.reinstantiate_extenders();
    }

    /// Destroy the current extender instances and run every factory again
    /// so extenders observe the fresh control list. Entries the previous
    /// instances registered are rolled back first.
    fn reinstantiate_extenders(self: &Arc<Self>) {
        if self.extender_factories.is_empty() {
            return;
        }
        lock_write(&self.validators).truncate(self.base_validators);
        lock_write(&self.warners).truncate(self.base_warners);
        lock_write(&self.transformers).truncate(self.base_transformers);
        {
            let mut handles = lock_mutex(&self.handles);
            for handle in handles.iter_mut() {
                handle.destroy();
            }
            handles.clear();
        }
        let controls = lock_read(&self.controls).clone();
        self.instantiate_extenders(controls);
    }

    fn refresh_controls(self: &Arc<Self>) {
        let controls = addressable_controls(&self.form);
        self.reflect_control_datasets(&controls);
        self.install_watchers(&controls);
        {
            let mut watched = lock_mutex(&self.watched);
            watched.retain(|(element, id)| {
                if self.form.contains(element) {
                    true
                } else {
                    element.unwatch(*id);
                    false
                }
            });
        }
        *lock_write(&self.controls) = controls;
    }

    // ---- Data writes ----

    pub(crate) fn write_data_at(&self, path: &FieldPath, value: Data) {
        let mut data = self.stores.data.get();
        data.set(path, value);
        let data = self.apply_transformers(data);
        self.stores.data.set(data);
    }

    /// Replace the whole data tree, running transformers.
    pub(crate) fn set_fields(&self, data: Data) {
        let data = self.apply_transformers(data);
        self.stores.data.set(data);
    }

    pub(crate) fn apply_transformers(&self, data: Data) -> Data {
        let transformers = lock_read(&self.transformers).clone();
        transformers.iter().fold(data, |data, transform| transform(data))
    }

    pub(crate) fn touch(&self, path: &FieldPath, target: &Element) {
        self.stores.touched.update(|touched| {
            touched.set_all(path, true);
        });
        self.stores.interacted.set(Some(target.element_id()));
    }

    /// Reset data to the initial values and clear interaction state.
    pub(crate) fn reset_state(&self) {
        let initial = lock_read(&self.initial).clone();
        self.stores.touched.set(initial.mirror(false));
        self.stores.interacted.set(None);
        self.stores.data.set(initial);
    }

    fn on_data_changed(self: &Arc<Self>) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        let data = self.stores.data.get();
        let initial = lock_read(&self.initial).clone();
        self.stores.is_dirty.set(data != initial);
        self.run_reactive();
    }

    // ---- Reactive validation ----

    /// Run the immediate validator sets against the current data and
    /// schedule the debounced sets.
    ///
    /// Reactive runs are fail-soft: a panicking validator is logged and
    /// the previous results for that half are retained.
    pub(crate) fn run_reactive(self: &Arc<Self>) {
        let data = self.stores.data.get();
        let validators = lock_read(&self.validators).clone();
        let warners = lock_read(&self.warners).clone();

        if !validators.is_empty() || !warners.is_empty() {
            let has_async = validators.iter().chain(&warners).any(Validator::is_async);
            if has_async {
                if let Ok(handle) = tokio::runtime::Handle::try_current() {
                    let engine = Arc::clone(self);
                    let data = data.clone();
                    let run = ValidationRun::begin(&self.stores);
                    handle.spawn(async move {
                        let _run = run;
                        let errors = execute_validation(&data, &validators).await;
                        let warnings = execute_validation(&data, &warners).await;
                        engine.apply_immediate(errors, warnings);
                    });
                } else {
                    warn!("async validators require a tokio runtime; running sync validators only");
                    let errors = execute_validation_sync(&data, &validators);
                    let warnings = execute_validation_sync(&data, &warners);
                    self.apply_immediate(errors, warnings);
                }
            } else {
                let errors = execute_validation_sync(&data, &validators);
                let warnings = execute_validation_sync(&data, &warners);
                self.apply_immediate(errors, warnings);
            }
        }

        let debounced_validators = lock_read(&self.debounced_validators).clone();
        let debounced_warners = lock_read(&self.debounced_warners).clone();
        if !debounced_validators.is_empty() || !debounced_warners.is_empty() {
            let engine = Arc::clone(self);
            self.debouncer.schedule(async move {
                let _run = ValidationRun::begin(&engine.stores);
                let errors = execute_validation(&data, &debounced_validators).await;
                let warnings = execute_validation(&data, &debounced_warners).await;
                engine.apply_debounced(errors, warnings);
            });
        }
    }

    fn apply_immediate(
        &self,
        errors: Result<Option<Errors>, crate::error::ValidatorPanic>,
        warnings: Result<Option<Errors>, crate::error::ValidatorPanic>,
    ) {
        let mut changed = false;
        {
            let mut split = lock_mutex(&self.split);
            match errors {
                Ok(errors) => {
                    split.immediate_errors = errors;
                    changed = true;
                }
                Err(panic) => warn!("validator panicked; keeping previous errors: {panic}"),
            }
            match warnings {
                Ok(warnings) => {
                    split.immediate_warnings = warnings;
                    changed = true;
                }
                Err(panic) => warn!("warning validator panicked; keeping previous warnings: {panic}"),
            }
        }
        if changed {
            self.publish_validation();
        }
    }

    fn apply_debounced(
        &self,
        errors: Result<Option<Errors>, crate::error::ValidatorPanic>,
        warnings: Result<Option<Errors>, crate::error::ValidatorPanic>,
    ) {
        let mut changed = false;
        {
            let mut split = lock_mutex(&self.split);
            match errors {
                Ok(errors) => {
                    split.debounced_errors = errors;
                    changed = true;
                }
                Err(panic) => warn!("debounced validator panicked; keeping previous errors: {panic}"),
            }
            match warnings {
                Ok(warnings) => {
                    split.debounced_warnings = warnings;
                    changed = true;
                }
                Err(panic) => {
                    warn!("debounced warning validator panicked; keeping previous warnings: {panic}");
                }
            }
        }
        if changed {
            self.publish_validation();
        }
    }

    /// Full-replace the errors and warnings stores with a submit-time
    /// result, clearing any stale debounced half.
    pub(crate) fn apply_submit_validation(
        &self,
        errors: Option<Errors>,
        warnings: Option<Errors>,
    ) {
        {
            let mut split = lock_mutex(&self.split);
            split.immediate_errors = errors;
            split.debounced_errors = None;
            split.immediate_warnings = warnings;
            split.debounced_warnings = None;
        }
        self.publish_validation();
    }

    /// Overwrite the errors half directly, bypassing validator runs. Used
    /// by the field helpers and submit recovery.
    pub(crate) fn overwrite_errors(&self, errors: Errors) {
        {
            let mut split = lock_mutex(&self.split);
            split.immediate_errors = Some(errors);
            split.debounced_errors = None;
        }
        self.publish_validation();
    }

    pub(crate) fn overwrite_warnings(&self, warnings: Errors) {
        {
            let mut split = lock_mutex(&self.split);
            split.immediate_warnings = Some(warnings);
            split.debounced_warnings = None;
        }
        self.publish_validation();
    }

    fn publish_validation(&self) {
        let (errors, warnings) = {
            let split = lock_mutex(&self.split);
            (
                merge_optional(split.immediate_errors.clone(), split.debounced_errors.clone())
                    .unwrap_or_else(Errors::map),
                merge_optional(
                    split.immediate_warnings.clone(),
                    split.debounced_warnings.clone(),
                )
                .unwrap_or_else(Errors::map),
            )
        };
        self.stores.errors.set(errors);
        self.stores.warnings.set(warnings);
    }

    /// Mirror per-field error messages onto each control's dataset,
    /// newline-joined, removing the entry when the field has none.
    fn reflect_validation_messages(&self, errors: &Errors) {
        for control in lock_read(&self.controls).iter() {
            let Some(path) = resolve_path(control) else {
                continue;
            };
            let message = match errors.get(&path) {
                Some(FieldNode::Leaf(messages)) if !messages.is_empty() => {
                    Some(messages.join("\n"))
                }
                _ => None,
            };
            match message {
                Some(message) => control.set_data(dataset::VALIDATION_MESSAGE, message),
                None => {
                    control.remove_data(dataset::VALIDATION_MESSAGE);
                }
            }
        }
    }

    // ---- Extender and validator registration ----

    pub(crate) fn add_validator(&self, validator: Validator) {
        lock_write(&self.validators).push(validator);
    }

    pub(crate) fn add_warner(&self, validator: Validator) {
        lock_write(&self.warners).push(validator);
    }

    pub(crate) fn add_transformer(&self, transformer: Transformer) {
        lock_write(&self.transformers).push(transformer);
    }

    pub(crate) fn all_validators(&self) -> Vec<Validator> {
        let mut all = lock_read(&self.validators).clone();
        all.extend(lock_read(&self.debounced_validators).iter().cloned());
        all
    }

    pub(crate) fn all_warners(&self) -> Vec<Validator> {
        let mut all = lock_read(&self.warners).clone();
        all.extend(lock_read(&self.debounced_warners).iter().cloned());
        all
    }

    pub(crate) fn notify_submit_error(&self, data: &Data, errors: &Errors) {
        let mut handles = lock_mutex(&self.handles);
        for handle in handles.iter_mut() {
            handle.on_submit_error(data, errors);
        }
    }

    // ---- Teardown ----

    /// Remove every listener, watcher, observer, and subscription, and
    /// release the bound marker. Idempotent.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        for id in lock_mutex(&self.listener_ids).drain(..) {
            self.form.remove_listener(id);
        }
        if let Some(id) = lock_mutex(&self.observer_id).take() {
            self.form.unobserve(id);
        }
        for (element, id) in lock_mutex(&self.watched).drain(..) {
            element.unwatch(id);
        }
        lock_mutex(&self.subscriptions).clear();
        self.debouncer.cancel();
        let mut handles = lock_mutex(&self.handles);
        for handle in handles.iter_mut() {
            handle.destroy();
        }
        handles.clear();
        self.form.remove_attr("novalidate");
        self.form.remove_data(dataset::BOUND);
    }
}

impl Drop for BoundForm {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for BoundForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoundForm(form={})", self.form.element_id())
    }
}

/// Handle to a bound form. Cheap to clone; clones share the engine.
#[derive(Clone, Debug)]
pub struct FormHandle {
    pub(crate) engine: Arc<BoundForm>,
}

impl FormHandle {
    pub fn form(&self) -> Element {
        self.engine.form.clone()
    }

    /// The addressable controls currently tracked, in tree order.
    pub fn controls(&self) -> Vec<Element> {
        lock_read(&self.engine.controls).clone()
    }

    pub fn stores(&self) -> &FormStores {
        &self.engine.stores
    }

    /// Unbind now instead of waiting for the last handle to drop.
    pub fn destroy(&self) {
        self.engine.destroy();
    }
}

// Poison-forgiving lock helpers.

fn lock_read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_mutex<T>(lock: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
