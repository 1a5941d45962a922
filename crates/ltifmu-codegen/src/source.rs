//! C source generation.
//!
//! The generated translation unit supplies the model-specific half of the
//! runtime contract: size and identity macros, the register-backed instance
//! struct, value-reference tables, coefficient tables and the hook routines
//! (`updateDerivatives`, `updateStates`, `updateOutputs`, `resetX`/`resetU`,
//! `evaluate`). The skeleton also expects the unit to provide its logging
//! macro and argument checks (`FILTERED_LOG`, `isInvalidState`, `isNullPtr`,
//! `isVROutOfRange`, `isInvalidNumber`, `unsupportedFunction`), so those are
//! emitted for every model. It then includes the fixed runtime skeleton, which implements
//! the host-facing lifecycle on top of those hooks.
//!
//! Anything governed by a zero dimension is left out entirely so the unit
//! compiles cleanly without unused or zero-length declarations.

use std::fmt;

use ltifmu_model::{Block, LtiModel, VariableLayout};
use ndarray::Array2;

use crate::error::{CodegenError, Result};
use crate::identity::BuildIdentity;
use crate::literal::{c_double, c_indices, c_row, c_vector};

/// Name of the generated translation unit inside `sources/`.
pub const SOURCE_FILE_NAME: &str = "fmi2model.c";

/// Header of the runtime skeleton included first.
pub const SKELETON_HEADER: &str = "fmi2Template.h";

/// Implementation of the runtime skeleton included last.
pub const SKELETON_IMPLEMENTATION: &str = "fmi2Template.c";

/// Minimum forward-Euler substeps taken per `updateStates` call. More are
/// taken when the communication step exceeds `EULER_SUBSTEPS * STEP_SIZE`.
pub const EULER_SUBSTEPS: u32 = 100;

/// Render the C source for `model`.
///
/// `layout` must be the layout computed for `model`; `step_size` is the
/// largest Euler substep, exported as `STEP_SIZE`.
pub fn render_source(
    model: &LtiModel,
    layout: &VariableLayout,
    identity: &BuildIdentity,
    step_size: f64,
) -> Result<String> {
    check_layout(model, layout)?;
    if !(step_size.is_finite() && step_size > 0.0) {
        return Err(CodegenError::InvalidStepSize { value: step_size });
    }
    let source = ModelSource {
        model,
        layout,
        identity,
        step_size,
    };
    tracing::debug!(
        identifier = identity.identifier(),
        nr = layout.register_count(),
        "rendering model source"
    );
    Ok(source.to_string())
}

pub(crate) fn check_layout(model: &LtiModel, layout: &VariableLayout) -> Result<()> {
    if (layout.nx(), layout.nu(), layout.ny()) != (model.nx(), model.nu(), model.ny()) {
        return Err(CodegenError::LayoutMismatch {
            layout_nx: layout.nx(),
            layout_nu: layout.nu(),
            layout_ny: layout.ny(),
            nx: model.nx(),
            nu: model.nu(),
            ny: model.ny(),
        });
    }
    Ok(())
}

struct ModelSource<'a> {
    model: &'a LtiModel,
    layout: &'a VariableLayout,
    identity: &'a BuildIdentity,
    step_size: f64,
}

impl ModelSource<'_> {
    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        writeln!(f, "/*")?;
        writeln!(f, " * Generated by ltifmu {}. Do not edit.", env!("CARGO_PKG_VERSION"))?;
        writeln!(f, " * Model:     {}", self.identity.identifier())?;
        writeln!(f, " * GUID:      {}", self.identity.guid())?;
        writeln!(f, " * Generated: {}", self.identity.timestamp_string())?;
        writeln!(f, " */")?;
        writeln!(f)?;
        writeln!(f, "#include \"{SKELETON_HEADER}\"")?;
        writeln!(f)?;
        writeln!(f, "#ifdef __cplusplus")?;
        writeln!(f, "extern \"C\" {{")?;
        writeln!(f, "#endif")?;
        writeln!(f)?;
        writeln!(f, "#define MODEL_IDENTIFIER {}", self.identity.identifier())?;
        writeln!(f, "#define MODEL_GUID \"{}\"", self.identity.guid())?;
        writeln!(f)?;
        writeln!(f, "#define NR {}", layout.register_count())?;
        writeln!(f, "#define NX {}", layout.nx())?;
        writeln!(f, "#define NU {}", layout.nu())?;
        writeln!(f, "#define NY {}", layout.ny())?;
        writeln!(f)?;
        writeln!(f, "#define STEP_SIZE {}", c_double(self.step_size))?;
        writeln!(f, "#define EULER_SUBSTEPS {EULER_SUBSTEPS}")?;
        writeln!(f)
    }

    fn write_instance(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NR is never zero-length in the struct: a model with no registers
        // still gets one unused slot.
        let slots = self.layout.register_count().max(1);
        writeln!(f, "typedef struct {{")?;
        writeln!(f, "    ModelState state;")?;
        writeln!(f, "    fmi2Real r[{slots}];")?;
        writeln!(f, "    fmi2Real time;")?;
        writeln!(f, "    fmi2Char instanceName[256];")?;
        writeln!(f, "    fmi2Type type;")?;
        writeln!(f, "    fmi2String GUID;")?;
        writeln!(f, "    const fmi2CallbackFunctions *functions;")?;
        writeln!(f, "    fmi2Boolean loggingOn;")?;
        writeln!(f, "    fmi2Boolean logCategories[NUMBER_OF_CATEGORIES];")?;
        writeln!(f, "    fmi2ComponentEnvironment componentEnvironment;")?;
        writeln!(f, "    fmi2Boolean isDirtyValues;")?;
        writeln!(f, "}} ModelInstance;")?;
        writeln!(f)?;
        writeln!(
            f,
            "static const fmi2String logCategoriesNames[] = {{\"logAll\", \"logError\", \"logFmiCall\", \"logEvent\"}};"
        )?;
        writeln!(f, "static ModelInstance instance;")?;
        writeln!(f)
    }

    fn write_tables(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        let (nx, nu, ny) = (layout.nx(), layout.nu(), layout.ny());

        let pointers = [
            ("_X", Block::State),
            ("_DER", Block::Derivative),
            ("_X0", Block::StateStart),
            ("_U", Block::Input),
            ("_U0", Block::InputStart),
            ("_Y", Block::Output),
        ];
        for (name, block) in pointers {
            if layout.size(block) > 0 {
                writeln!(f, "#define {name:<4} (comp->r + {})", layout.base(block))?;
            }
        }
        writeln!(f)?;

        for block in [Block::State, Block::Derivative, Block::Output] {
            let size = layout.size(block);
            if size > 0 {
                writeln!(
                    f,
                    "static const fmi2ValueReference vrs_{}[{size}] = {{ {} }};",
                    block.short_name(),
                    c_indices(layout.range(block)),
                )?;
            }
        }
        writeln!(f)?;

        let m = self.model;
        if nx > 0 {
            write_matrix(f, "A", m.a())?;
        }
        if nx > 0 && nu > 0 {
            write_matrix(f, "B", m.b())?;
        }
        if nx > 0 && ny > 0 {
            write_matrix(f, "C", m.c())?;
        }
        if ny > 0 && nu > 0 {
            write_matrix(f, "D", m.d())?;
        }
        if nx > 0 {
            writeln!(f, "static const fmi2Real x0_reset[{nx}] = {{ {} }};", c_vector(m.x0()))?;
        }
        if nu > 0 {
            writeln!(f, "static const fmi2Real u0_reset[{nu}] = {{ {} }};", c_vector(m.u0()))?;
        }
        writeln!(f)
    }

    fn write_support(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SUPPORT)?;
        writeln!(f)
    }

    fn write_hooks(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nx, nu, ny) = (self.layout.nx(), self.layout.nu(), self.layout.ny());

        if nx > 0 || (ny > 0 && nu > 0) {
            writeln!(
                f,
                "static fmi2Real innerProduct(const fmi2Real *v1, const fmi2Real *v2, size_t n) {{"
            )?;
            writeln!(f, "    size_t i;")?;
            writeln!(f, "    fmi2Real ret = 0.0;")?;
            writeln!(f, "    for (i = 0; i < n; ++i) {{")?;
            writeln!(f, "        ret += v1[i] * v2[i];")?;
            writeln!(f, "    }}")?;
            writeln!(f, "    return ret;")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        if nx > 0 {
            writeln!(f, "static void updateDerivatives(ModelInstance *comp) {{")?;
            writeln!(f, "    size_t i;")?;
            writeln!(f, "    for (i = 0; i < NX; i++) {{")?;
            writeln!(f, "        fmi2ValueReference der_i = vrs_der[i];")?;
            writeln!(f, "        comp->r[der_i] = innerProduct(A[i], _X, NX);")?;
            if nu > 0 {
                writeln!(f, "        comp->r[der_i] += innerProduct(B[i], _U, NU);")?;
            }
            writeln!(f, "    }}")?;
            writeln!(f, "}}")?;
            writeln!(f)?;

            writeln!(f, "/* Forward Euler; no substep is longer than STEP_SIZE. */")?;
            writeln!(f, "static void updateStates(ModelInstance *comp, fmi2Real h) {{")?;
            writeln!(f, "    size_t n = (size_t)(h / STEP_SIZE);")?;
            writeln!(f, "    size_t k, i;")?;
            writeln!(f, "    fmi2Real dt;")?;
            writeln!(f, "    if ((fmi2Real)n * STEP_SIZE < h) n++;")?;
            writeln!(f, "    if (n < EULER_SUBSTEPS) n = EULER_SUBSTEPS;")?;
            writeln!(f, "    dt = h / (fmi2Real)n;")?;
            writeln!(f, "    for (k = 0; k < n; k++) {{")?;
            writeln!(f, "        updateDerivatives(comp);")?;
            writeln!(f, "        for (i = 0; i < NX; i++) {{")?;
            writeln!(f, "            comp->r[vrs_x[i]] += dt * comp->r[vrs_der[i]];")?;
            writeln!(f, "        }}")?;
            writeln!(f, "    }}")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        // The skeleton's doStep calls updateOutputs unconditionally.
        writeln!(f, "static void updateOutputs(ModelInstance *comp) {{")?;
        if ny == 0 {
            writeln!(f, "    (void)comp;")?;
        } else {
            writeln!(f, "    size_t i;")?;
            writeln!(f, "    for (i = 0; i < NY; i++) {{")?;
            writeln!(f, "        fmi2ValueReference y_i = vrs_y[i];")?;
            writeln!(f, "        comp->r[y_i] = 0.0;")?;
            if nx > 0 {
                writeln!(f, "        comp->r[y_i] += innerProduct(C[i], _X, NX);")?;
            }
            if nu > 0 {
                writeln!(f, "        comp->r[y_i] += innerProduct(D[i], _U, NU);")?;
            }
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")?;
        writeln!(f)?;

        if nx > 0 {
            writeln!(f, "static void copyX0toX(ModelInstance *comp) {{")?;
            writeln!(f, "    memcpy(_X, _X0, NX * sizeof(fmi2Real));")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
            writeln!(f, "static void resetX(ModelInstance *comp) {{")?;
            writeln!(f, "    memcpy(_X0, x0_reset, NX * sizeof(fmi2Real));")?;
            writeln!(f, "    copyX0toX(comp);")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        if nu > 0 {
            writeln!(f, "static void copyU0toU(ModelInstance *comp) {{")?;
            writeln!(f, "    memcpy(_U, _U0, NU * sizeof(fmi2Real));")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
            writeln!(f, "static void resetU(ModelInstance *comp) {{")?;
            writeln!(f, "    memcpy(_U0, u0_reset, NU * sizeof(fmi2Real));")?;
            writeln!(f, "    copyU0toU(comp);")?;
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        writeln!(f, "static void evaluate(ModelInstance *comp) {{")?;
        if nx > 0 {
            writeln!(f, "    updateDerivatives(comp);")?;
        }
        if ny > 0 {
            writeln!(f, "    updateOutputs(comp);")?;
        }
        if nx == 0 && ny == 0 {
            writeln!(f, "    (void)comp;")?;
        }
        writeln!(f, "}}")?;
        writeln!(f)
    }
}

impl fmt::Display for ModelSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;
        self.write_instance(f)?;
        self.write_tables(f)?;
        self.write_support(f)?;
        self.write_hooks(f)?;
        writeln!(f, "#include \"{SKELETON_IMPLEMENTATION}\"")?;
        writeln!(f)?;
        writeln!(f, "#ifdef __cplusplus")?;
        writeln!(f, "}}")?;
        writeln!(f, "#endif")
    }
}

// Logging and argument checks the skeleton calls into. Emitted verbatim for
// every model, including ones with no registers.
const SUPPORT: &str = r#"#define FILTERED_LOG(instance, status, categoryIndex, message, ...) \
    if (status == fmi2Error || status == fmi2Fatal \
        || isCategoryLogged(instance, categoryIndex)) \
        instance->functions->logger(instance->functions->componentEnvironment, \
            instance->instanceName, status, logCategoriesNames[categoryIndex], message, \
            ##__VA_ARGS__);

#ifndef max
#define max(a, b) ((a) > (b) ? (a) : (b))
#endif

static fmi2Boolean isCategoryLogged(ModelInstance *comp, int categoryIndex) {
    if (categoryIndex < NUMBER_OF_CATEGORIES
        && (comp->logCategories[categoryIndex] || comp->logCategories[LOG_ALL])) {
        return fmi2True;
    }
    return fmi2False;
}

static fmi2Boolean isInvalidState(ModelInstance *comp, const char *f, int statesExpected) {
    if (!comp)
        return fmi2True;
    if (!(comp->state & statesExpected)) {
        comp->state = modelError;
        FILTERED_LOG(comp, fmi2Error, LOG_ERROR, "%s: Illegal call sequence.", f)
        return fmi2True;
    }
    return fmi2False;
}

static fmi2Boolean isNullPtr(ModelInstance *comp, const char *f, const char *arg,
    const void *p) {
    if (!p) {
        comp->state = modelError;
        FILTERED_LOG(comp, fmi2Error, LOG_ERROR, "%s: Invalid argument %s = NULL.", f, arg)
        return fmi2True;
    }
    return fmi2False;
}

static fmi2Boolean isVROutOfRange(ModelInstance *comp, const char *f, fmi2ValueReference vr,
    int end) {
    if (vr >= (fmi2ValueReference)end) {
        comp->state = modelError;
        FILTERED_LOG(comp, fmi2Error, LOG_ERROR, "%s: Illegal value reference %u.", f, vr)
        return fmi2True;
    }
    return fmi2False;
}

static fmi2Boolean isInvalidNumber(ModelInstance *comp, const char *f, const char *arg, int n,
    int nExpected) {
    if (n != nExpected) {
        comp->state = modelError;
        FILTERED_LOG(comp, fmi2Error, LOG_ERROR, "%s: Invalid argument %s = %d. Expected %d.", f, arg,
            n, nExpected)
        return fmi2True;
    }
    return fmi2False;
}

static fmi2Status unsupportedFunction(fmi2Component c, const char *fName, int statesExpected) {
    ModelInstance *comp = (ModelInstance *)c;
    if (isInvalidState(comp, fName, statesExpected))
        return fmi2Error;
    FILTERED_LOG(comp, fmi2OK, LOG_FMI_CALL, "%s", fName)
    FILTERED_LOG(comp, fmi2Error, LOG_ERROR, "%s: Function not implemented.", fName)
    return fmi2Error;
}
"#;

fn write_matrix(f: &mut fmt::Formatter<'_>, name: &str, m: &Array2<f64>) -> fmt::Result {
    let (rows, cols) = m.dim();
    writeln!(f, "static const fmi2Real {name}[{rows}][{cols}] = {{")?;
    for row in m.rows() {
        writeln!(f, "    {{ {} }},", c_row(row))?;
    }
    writeln!(f, "}};")
}
